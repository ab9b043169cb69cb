// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request validation.

use std::fmt;

use serde_json::{Map, Value};
use zeroize::Zeroizing;

use super::error::RelayError;
use crate::blockchain::{AccountId, AmountError, HumanAmount};

pub const SIGNER_ID_FIELD: &str = "signerId";
pub const PRIVATE_KEY_FIELD: &str = "privateKey";
pub const RECEIVER_ID_FIELD: &str = "receiverId";
pub const AMOUNT_FIELD: &str = "amount";

const REQUIRED_FIELDS: [&str; 4] = [
    SIGNER_ID_FIELD,
    PRIVATE_KEY_FIELD,
    RECEIVER_ID_FIELD,
    AMOUNT_FIELD,
];

/// The raw secret key string, wiped from memory on drop.
pub struct SecretKeyString(Zeroizing<String>);

impl SecretKeyString {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretKeyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// A validated transfer request.
#[derive(Debug)]
pub struct TransferRequest {
    pub signer_id: AccountId,
    pub secret: SecretKeyString,
    pub receiver_id: AccountId,
    pub amount: HumanAmount,
}

/// Validate a decoded request body.
///
/// Presence of all four fields is checked before any shape check, so a body
/// missing `amount` reports the missing field even if `signerId` is malformed.
pub fn validate(body: &Value) -> Result<TransferRequest, RelayError> {
    let map = body
        .as_object()
        .ok_or_else(|| RelayError::invalid_field("request body", "must be a JSON object."))?;

    for field in REQUIRED_FIELDS {
        required(map, field)?;
    }

    let signer_id = account_field(map, SIGNER_ID_FIELD)?;
    let secret = SecretKeyString(Zeroizing::new(
        string_field(map, PRIVATE_KEY_FIELD)?.to_string(),
    ));
    let receiver_id = account_field(map, RECEIVER_ID_FIELD)?;
    let amount = amount_field(map)?;

    Ok(TransferRequest {
        signer_id,
        secret,
        receiver_id,
        amount,
    })
}

fn required<'a>(map: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, RelayError> {
    match map.get(field) {
        None | Some(Value::Null) => Err(RelayError::MissingField(field)),
        Some(value) => Ok(value),
    }
}

fn string_field<'a>(
    map: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, RelayError> {
    required(map, field)?
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| RelayError::invalid_field(field, "must be a non-empty string."))
}

fn account_field(map: &Map<String, Value>, field: &'static str) -> Result<AccountId, RelayError> {
    let raw = string_field(map, field)?;
    AccountId::try_from(raw)
        .map_err(|reason| RelayError::invalid_field(field, format!("is not a valid account id ({reason}).")))
}

fn amount_field(map: &Map<String, Value>) -> Result<HumanAmount, RelayError> {
    let not_positive = || RelayError::invalid_field(AMOUNT_FIELD, "must be a positive number.");

    let Value::Number(number) = required(map, AMOUNT_FIELD)? else {
        return Err(not_positive());
    };

    match HumanAmount::parse(&number.to_string()) {
        Ok(amount) => Ok(amount),
        Err(AmountError::NotPositive | AmountError::Malformed) => Err(not_positive()),
        Err(other) => Err(RelayError::InvalidAmount(other)),
    }
}
