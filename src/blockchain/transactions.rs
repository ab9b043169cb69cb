// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction building and amount conversion for NEAR.
//!
//! Transactions are Borsh-encoded exactly as the protocol expects. The
//! transaction id is the SHA-256 of the encoded unsigned transaction, so it
//! is known before anything is broadcast.

use std::fmt;

use base64ct::{Base64, Encoding};
use borsh::{io, BorshSerialize};
use sha2::{Digest, Sha256};

use super::signing::{PublicKey, SigningCredential};
use super::types::AccountId;

/// Borsh tag for ed25519 keys and signatures.
const ED25519_KEY_TYPE: u8 = 0;

/// Borsh variant index of `Action::Transfer` in the protocol's action enum.
const TRANSFER_ACTION_INDEX: u8 = 3;

/// Largest exponent magnitude accepted in `1e<n>` amount notation.
const MAX_AMOUNT_EXPONENT: i32 = 128;

impl BorshSerialize for PublicKey {
    fn serialize<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        ED25519_KEY_TYPE.serialize(writer)?;
        self.0.serialize(writer)
    }
}

/// Actions supported by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Move `deposit` yoctoNEAR from signer to receiver.
    Transfer { deposit: u128 },
}

impl BorshSerialize for Action {
    fn serialize<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            Action::Transfer { deposit } => {
                TRANSFER_ACTION_INDEX.serialize(writer)?;
                deposit.serialize(writer)
            }
        }
    }
}

/// An unsigned NEAR transaction (V0 layout).
#[derive(Debug, Clone, BorshSerialize)]
pub struct Transaction {
    pub signer_id: String,
    pub public_key: PublicKey,
    pub nonce: u64,
    pub receiver_id: String,
    pub block_hash: [u8; 32],
    pub actions: Vec<Action>,
}

impl Transaction {
    /// Build a single-action native transfer.
    pub fn transfer(
        signer_id: &AccountId,
        public_key: PublicKey,
        nonce: u64,
        receiver_id: &AccountId,
        block_hash: [u8; 32],
        deposit: u128,
    ) -> Self {
        Self {
            signer_id: signer_id.to_string(),
            public_key,
            nonce,
            receiver_id: receiver_id.to_string(),
            block_hash,
            actions: vec![Action::Transfer { deposit }],
        }
    }

    /// SHA-256 of the Borsh encoding; the network's transaction id.
    pub fn hash(&self) -> io::Result<[u8; 32]> {
        let encoded = borsh::to_vec(self)?;
        Ok(Sha256::digest(&encoded).into())
    }

    /// Sign the transaction hash with the credential.
    pub fn sign(self, credential: &SigningCredential) -> io::Result<SignedTransaction> {
        let hash = self.hash()?;
        let signature = credential.sign(&hash);
        Ok(SignedTransaction {
            transaction: self,
            signature: Ed25519Signature(signature),
            hash,
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature(pub [u8; 64]);

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ed25519:{}", bs58::encode(self.0).into_string())
    }
}

impl BorshSerialize for Ed25519Signature {
    fn serialize<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        ED25519_KEY_TYPE.serialize(writer)?;
        self.0.serialize(writer)
    }
}

/// A signed transaction ready to broadcast.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub signature: Ed25519Signature,
    hash: [u8; 32],
}

impl SignedTransaction {
    /// Transaction id in the base58 form the network reports.
    pub fn hash_base58(&self) -> String {
        bs58::encode(self.hash).into_string()
    }

    /// Base64 Borsh encoding for `send_tx`.
    pub fn to_base64(&self) -> io::Result<String> {
        let mut encoded = borsh::to_vec(&self.transaction)?;
        self.signature.serialize(&mut encoded)?;
        Ok(Base64::encode_string(&encoded))
    }
}

/// Reasons a human-readable amount cannot be converted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is not a decimal number")]
    Malformed,

    #[error("amount must be a positive number.")]
    NotPositive,

    #[error("amount has more than {0} decimal places")]
    TooPrecise(u8),

    #[error("amount is too large")]
    Overflow,

    #[error("amount exponent is out of range")]
    ExponentOutOfRange,
}

/// A non-negative decimal amount kept as its exact digits.
///
/// Parsed from the textual form of a JSON number, so `1.5` stays `1.5` and
/// never passes through floating point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanAmount {
    whole: String,
    fraction: String,
}

impl HumanAmount {
    /// Parse a decimal literal, including exponent notation (`1e-3`, `2.5E2`).
    pub fn parse(text: &str) -> Result<Self, AmountError> {
        let text = text.trim();
        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };

        let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
            Some(idx) => {
                let exp: i32 = unsigned[idx + 1..]
                    .parse()
                    .map_err(|_| AmountError::Malformed)?;
                if exp.abs() > MAX_AMOUNT_EXPONENT {
                    return Err(AmountError::ExponentOutOfRange);
                }
                (&unsigned[..idx], exp)
            }
            None => (unsigned, 0),
        };

        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(AmountError::Malformed);
        }
        if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return Err(AmountError::Malformed);
        }

        // Shift the decimal point by the exponent over the full digit string.
        let digits = format!("{int_part}{frac_part}");
        let point = int_part.len() as i64 + exponent as i64;
        let (whole, fraction) = if point <= 0 {
            (String::new(), format!("{}{digits}", "0".repeat((-point) as usize)))
        } else if point as usize >= digits.len() {
            (
                format!("{digits}{}", "0".repeat(point as usize - digits.len())),
                String::new(),
            )
        } else {
            let (w, f) = digits.split_at(point as usize);
            (w.to_string(), f.to_string())
        };

        let whole = whole.trim_start_matches('0').to_string();
        let fraction = fraction.trim_end_matches('0').to_string();
        let amount = Self { whole, fraction };

        if negative || amount.is_zero() {
            return Err(AmountError::NotPositive);
        }
        Ok(amount)
    }

    pub fn is_zero(&self) -> bool {
        self.whole.is_empty() && self.fraction.is_empty()
    }

    /// Convert to atomic units at the given scale.
    ///
    /// # Arguments
    /// * `decimals` - Power of ten per whole unit (24 for NEAR)
    ///
    /// # Returns
    /// * `Ok(u128)` - Exact amount in atomic units
    /// * `Err(AmountError)` - If the amount needs more precision than the
    ///   scale offers, rounds to zero, or overflows
    pub fn to_atomic_units(&self, decimals: u8) -> Result<u128, AmountError> {
        if self.fraction.len() > decimals as usize {
            return Err(AmountError::TooPrecise(decimals));
        }

        let whole = if self.whole.is_empty() {
            0u128
        } else {
            self.whole.parse::<u128>().map_err(|_| AmountError::Overflow)?
        };

        let fraction = if self.fraction.is_empty() {
            0u128
        } else {
            let padded = format!("{:0<width$}", self.fraction, width = decimals as usize);
            padded.parse::<u128>().map_err(|_| AmountError::Overflow)?
        };

        let multiplier = 10u128
            .checked_pow(decimals as u32)
            .ok_or(AmountError::Overflow)?;
        let total = whole
            .checked_mul(multiplier)
            .and_then(|w| w.checked_add(fraction))
            .ok_or(AmountError::Overflow)?;

        if total == 0 {
            return Err(AmountError::NotPositive);
        }
        Ok(total)
    }
}

impl fmt::Display for HumanAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = if self.whole.is_empty() { "0" } else { &self.whole };
        if self.fraction.is_empty() {
            f.write_str(whole)
        } else {
            write!(f, "{whole}.{}", self.fraction)
        }
    }
}

/// Format atomic units as a human-readable amount.
pub fn format_amount(amount: u128, decimals: u8) -> String {
    if amount == 0 {
        return "0".to_string();
    }

    let divisor = 10u128.pow(decimals as u32);
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder == 0 {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        format!("{}.{}", whole, decimal_str.trim_end_matches('0'))
    }
}
