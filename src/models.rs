// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the relay API. Field names are camelCase
//! on the wire. All types derive `ToSchema` for the OpenAPI document.
//!
//! The relay endpoint reads its body as raw JSON so that validation can name
//! the offending field; [`SendRequest`] documents that body but is not used
//! to decode it.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::blockchain::TxOutcome;

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

// =============================================================================
// Sign and Send
// =============================================================================

/// Transfer request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    /// Account that signs and pays (e.g. `bot.testnet`)
    pub signer_id: String,
    /// `ed25519:<base58>` secret key of `signerId`
    pub private_key: String,
    /// Account that receives the funds
    pub receiver_id: String,
    /// Amount in NEAR, as a JSON number (e.g. `1.5`)
    #[schema(value_type = f64)]
    pub amount: serde_json::Number,
}

/// Transfer accepted by the network.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    /// Always `success`
    pub status: String,
    pub transaction_hash: String,
}

impl SuccessResponse {
    pub fn new(transaction_hash: impl Into<String>) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            transaction_hash: transaction_hash.into(),
        }
    }
}

/// Error body shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `error`
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Transaction Status
// =============================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TransactionStatusQuery {
    /// Account that signed the transaction
    pub signer_id: Option<String>,
}

/// Where a transaction stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TxOutcomeKind {
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatusResponse {
    /// Always `success`; the lookup itself worked
    pub status: String,
    pub transaction_hash: String,
    /// `wait_until` level the network reports as reached
    pub execution_status: String,
    pub outcome: TxOutcomeKind,
    /// Failure reason when `outcome` is `failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TransactionStatusResponse {
    pub fn from_outcome(tx_hash: &str, outcome: TxOutcome) -> Self {
        let (kind, message) = match outcome.failure {
            Some(failure) => (TxOutcomeKind::Failed, Some(failure.message)),
            None if outcome.execution_status.is_executed() => (TxOutcomeKind::Succeeded, None),
            None => (TxOutcomeKind::Pending, None),
        };

        Self {
            status: STATUS_SUCCESS.to_string(),
            transaction_hash: outcome
                .transaction_hash
                .unwrap_or_else(|| tx_hash.to_string()),
            execution_status: outcome.execution_status.as_str().to_string(),
            outcome: kind,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{FailureKind, TxExecutionStatus, TxFailure};
    use serde_json::json;

    #[test]
    fn success_response_is_camel_case() {
        let body = serde_json::to_value(SuccessResponse::new("abc")).unwrap();
        assert_eq!(body, json!({"status": "success", "transactionHash": "abc"}));
    }

    #[test]
    fn error_response_shape() {
        let body = serde_json::to_value(ErrorResponse::new("nope")).unwrap();
        assert_eq!(body, json!({"status": "error", "message": "nope"}));
    }

    #[test]
    fn status_outcome_classification() {
        let executed = TransactionStatusResponse::from_outcome(
            "h",
            TxOutcome {
                transaction_hash: None,
                execution_status: TxExecutionStatus::Final,
                failure: None,
            },
        );
        assert_eq!(executed.outcome, TxOutcomeKind::Succeeded);
        assert_eq!(executed.transaction_hash, "h");

        let pending = TransactionStatusResponse::from_outcome(
            "h",
            TxOutcome {
                transaction_hash: Some("h".into()),
                execution_status: TxExecutionStatus::Included,
                failure: None,
            },
        );
        assert_eq!(pending.outcome, TxOutcomeKind::Pending);

        let failed = TransactionStatusResponse::from_outcome(
            "h",
            TxOutcome {
                transaction_hash: Some("h".into()),
                execution_status: TxExecutionStatus::Final,
                failure: Some(TxFailure {
                    kind: FailureKind::ExecutionFailed,
                    message: "boom".into(),
                }),
            },
        );
        assert_eq!(failed.outcome, TxOutcomeKind::Failed);
        let body = serde_json::to_value(&failed).unwrap();
        assert_eq!(body["message"], "boom");
        assert_eq!(body["outcome"], "failed");
    }
}
