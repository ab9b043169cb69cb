// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! NEAR network types and constants.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// NEAR network configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network identifier the signing key is bound to
    pub network_id: &'static str,
    /// Default RPC endpoint URL
    pub rpc_url: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
    /// Number of atomic units (yoctoNEAR) per whole NEAR, as a power of ten
    pub decimals: u8,
}

/// NEAR Testnet configuration.
pub const NEAR_TESTNET: NetworkConfig = NetworkConfig {
    network_id: "testnet",
    rpc_url: "https://rpc.testnet.near.org",
    explorer_url: "https://testnet.nearblocks.io",
    decimals: 24,
};

/// NEAR Mainnet configuration.
pub const NEAR_MAINNET: NetworkConfig = NetworkConfig {
    network_id: "mainnet",
    rpc_url: "https://rpc.mainnet.near.org",
    explorer_url: "https://nearblocks.io",
    decimals: 24,
};

/// Resolve a network by its identifier.
pub fn network_by_id(raw: &str) -> Option<NetworkConfig> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "testnet" => Some(NEAR_TESTNET),
        "mainnet" => Some(NEAR_MAINNET),
        _ => None,
    }
}

const MIN_ACCOUNT_ID_LEN: usize = 2;
const MAX_ACCOUNT_ID_LEN: usize = 64;

/// A syntactically valid NEAR account id.
///
/// Named accounts are 2-64 characters of lower case alphanumerics split by
/// single `-`, `_` or `.` separators. Implicit accounts (64 hex chars) satisfy
/// the same rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_account_id(&value)?;
        Ok(Self(value))
    }
}

impl TryFrom<&str> for AccountId {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_account_id(id: &str) -> Result<(), String> {
    if id.len() < MIN_ACCOUNT_ID_LEN || id.len() > MAX_ACCOUNT_ID_LEN {
        return Err(format!(
            "account id must be {MIN_ACCOUNT_ID_LEN}-{MAX_ACCOUNT_ID_LEN} characters"
        ));
    }

    let mut last_was_separator = true;
    for c in id.chars() {
        match c {
            'a'..='z' | '0'..='9' => last_was_separator = false,
            '-' | '_' | '.' => {
                if last_was_separator {
                    return Err("account id has a misplaced separator".to_string());
                }
                last_was_separator = true;
            }
            _ => return Err(format!("account id contains invalid character {c:?}")),
        }
    }

    if last_was_separator {
        return Err("account id cannot end with a separator".to_string());
    }
    Ok(())
}

/// How long `send_tx` waits before answering.
///
/// Ordered from weakest to strongest guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxExecutionStatus {
    None,
    Included,
    ExecutedOptimistic,
    IncludedFinal,
    Executed,
    Final,
}

impl TxExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Included => "INCLUDED",
            Self::ExecutedOptimistic => "EXECUTED_OPTIMISTIC",
            Self::IncludedFinal => "INCLUDED_FINAL",
            Self::Executed => "EXECUTED",
            Self::Final => "FINAL",
        }
    }

    /// Whether the transaction outcome (success or failure) is known at this status.
    pub fn is_executed(&self) -> bool {
        matches!(self, Self::ExecutedOptimistic | Self::Executed | Self::Final)
    }
}

impl std::str::FromStr for TxExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(Self::None),
            "INCLUDED" => Ok(Self::Included),
            "EXECUTED_OPTIMISTIC" => Ok(Self::ExecutedOptimistic),
            "INCLUDED_FINAL" => Ok(Self::IncludedFinal),
            "EXECUTED" => Ok(Self::Executed),
            "FINAL" => Ok(Self::Final),
            other => Err(format!("unknown execution status `{other}`")),
        }
    }
}

impl fmt::Display for TxExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
