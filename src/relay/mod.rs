// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The sign-and-send relay.
//!
//! One call walks `Validating → ConvertingAmount → MaterializingKey →
//! SubmittingTransaction` and ends `Succeeded` or `Failed`. Nothing survives
//! the call except the per-account lock entry while a submission is in
//! flight.

pub mod error;
pub mod locks;
pub mod validation;

use std::{fmt, sync::Arc};

use serde_json::Value;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::blockchain::{
    client::decode_hash, format_amount, materialize, AccessKeyView, AccountId, FailureKind,
    HumanAmount, NearRpc, NearRpcError, SignedTransaction, SigningCredential, Transaction,
    TxExecutionStatus, TxOutcome,
};
use crate::config::RelayConfig;

pub use error::RelayError;
pub use locks::{AccountGuard, AccountLocks};
pub use validation::{validate, TransferRequest};

/// Where a relay call currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStage {
    Validating,
    ConvertingAmount,
    MaterializingKey,
    SubmittingTransaction,
    Succeeded,
    Failed,
}

impl fmt::Display for RelayStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validating => "validating",
            Self::ConvertingAmount => "converting_amount",
            Self::MaterializingKey => "materializing_key",
            Self::SubmittingTransaction => "submitting_transaction",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    Success {
        transaction_hash: String,
    },
    Failure {
        kind: FailureKind,
        message: String,
        http_status: Option<u16>,
    },
}

impl SubmissionResult {
    fn timed_out(limit: std::time::Duration, tx_hash: Option<&str>) -> Self {
        let message = match tx_hash {
            Some(hash) => format!(
                "Timed out after {limit:?} waiting for the network to acknowledge transaction {hash}; \
                 it may still be included, check its status before retrying."
            ),
            None => format!("Timed out after {limit:?} waiting for the network."),
        };
        Self::Failure {
            kind: FailureKind::Timeout,
            message,
            http_status: None,
        }
    }

    pub fn into_result(self) -> Result<String, RelayError> {
        match self {
            Self::Success { transaction_hash } => Ok(transaction_hash),
            Self::Failure {
                kind: FailureKind::Timeout,
                message,
                ..
            } => Err(RelayError::Timeout { message }),
            Self::Failure {
                kind,
                message,
                http_status,
            } => Err(RelayError::Network {
                kind,
                message,
                http_status,
            }),
        }
    }
}

impl From<NearRpcError> for SubmissionResult {
    fn from(err: NearRpcError) -> Self {
        Self::Failure {
            kind: err.kind,
            message: err.message,
            http_status: err.http_status,
        }
    }
}

/// Proof of an accepted transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub transaction_hash: String,
    pub signer_id: AccountId,
    pub receiver_id: AccountId,
    /// Amount moved, in yoctoNEAR
    pub atomic_amount: u128,
}

/// A single-use view of the network for one credential.
///
/// Opened per submission and dropped with it.
pub struct NetworkSession<'a> {
    rpc: &'a dyn NearRpc,
    credential: &'a SigningCredential,
    wait_until: TxExecutionStatus,
}

impl<'a> NetworkSession<'a> {
    pub fn open(
        rpc: &'a dyn NearRpc,
        credential: &'a SigningCredential,
        wait_until: TxExecutionStatus,
    ) -> Self {
        Self {
            rpc,
            credential,
            wait_until,
        }
    }

    /// Current nonce and a recent block hash for the signer's key.
    pub async fn access_key(&self) -> Result<AccessKeyView, NearRpcError> {
        let view = self
            .rpc
            .view_access_key(self.credential.account_id(), &self.credential.public_key())
            .await?;

        if !view.full_access {
            return Err(NearRpcError::new(
                FailureKind::InvalidTransaction,
                format!(
                    "Access key {} of {} is not a full access key and cannot transfer funds",
                    self.credential.public_key(),
                    self.credential.account_id()
                ),
            ));
        }
        Ok(view)
    }

    /// Build and sign the transfer against the looked-up access key.
    pub fn sign_transfer(
        &self,
        access_key: &AccessKeyView,
        receiver_id: &AccountId,
        atomic_amount: u128,
    ) -> Result<SignedTransaction, NearRpcError> {
        let nonce = access_key.nonce.checked_add(1).ok_or_else(|| {
            NearRpcError::new(FailureKind::InvalidTransaction, "Access key nonce overflow")
        })?;

        Transaction::transfer(
            self.credential.account_id(),
            self.credential.public_key(),
            nonce,
            receiver_id,
            access_key.block_hash,
            atomic_amount,
        )
        .sign(self.credential)
        .map_err(|e| {
            NearRpcError::new(
                FailureKind::InvalidTransaction,
                format!("Failed to encode transaction: {e}"),
            )
        })
    }

    /// Broadcast and wait for the configured execution status.
    pub async fn broadcast(&self, signed: &SignedTransaction) -> Result<TxOutcome, NearRpcError> {
        let encoded = signed.to_base64().map_err(|e| {
            NearRpcError::new(
                FailureKind::InvalidTransaction,
                format!("Failed to encode transaction: {e}"),
            )
        })?;
        self.rpc.send_transaction(&encoded, self.wait_until).await
    }
}

/// Signs and submits native NEAR transfers.
pub struct TransferRelay {
    config: RelayConfig,
    rpc: Arc<dyn NearRpc>,
    locks: AccountLocks,
}

impl TransferRelay {
    pub fn new(config: RelayConfig, rpc: Arc<dyn NearRpc>) -> Self {
        Self {
            config,
            rpc,
            locks: AccountLocks::new(),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn rpc(&self) -> &dyn NearRpc {
        self.rpc.as_ref()
    }

    /// Run one transfer end to end from a decoded JSON body.
    pub async fn relay(&self, body: &Value) -> Result<TransferReceipt, RelayError> {
        let span = info_span!(
            "relay",
            call_id = %Uuid::new_v4(),
            network = tracing::field::Empty,
            signer = tracing::field::Empty,
            receiver = tracing::field::Empty,
            amount = tracing::field::Empty,
        );

        async {
            let mut stage = RelayStage::Validating;
            let result = self.run(body, &mut stage).await;

            match &result {
                Ok(receipt) => {
                    info!(
                        stage = %RelayStage::Succeeded,
                        tx_hash = %receipt.transaction_hash,
                        explorer = %format!(
                            "{}/txns/{}",
                            self.config.network.explorer_url, receipt.transaction_hash
                        ),
                        "Transfer submitted"
                    );
                }
                Err(err) if err.status_code().is_client_error() => {
                    warn!(
                        stage = %RelayStage::Failed,
                        failed_at = %stage,
                        kind = err.kind(),
                        error = %err,
                        "Transfer rejected"
                    );
                }
                Err(err) => {
                    error!(
                        stage = %RelayStage::Failed,
                        failed_at = %stage,
                        kind = err.kind(),
                        http_status = ?err.http_status(),
                        error = %err,
                        "Transfer failed"
                    );
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        body: &Value,
        stage: &mut RelayStage,
    ) -> Result<TransferReceipt, RelayError> {
        let request = validate(body)?;
        let span = tracing::Span::current();
        span.record("signer", tracing::field::display(&request.signer_id));
        span.record("receiver", tracing::field::display(&request.receiver_id));
        span.record("amount", tracing::field::display(&request.amount));

        *stage = RelayStage::ConvertingAmount;
        let atomic_amount = self.to_atomic_units(&request.amount)?;

        *stage = RelayStage::MaterializingKey;
        let credential = materialize(
            request.signer_id.clone(),
            self.config.network.network_id,
            request.secret.expose(),
        )?;
        drop(request.secret);
        span.record("network", credential.network_id());

        *stage = RelayStage::SubmittingTransaction;
        let transaction_hash = self
            .submit(&credential, &request.receiver_id, atomic_amount)
            .await
            .into_result()?;

        Ok(TransferReceipt {
            transaction_hash,
            signer_id: request.signer_id,
            receiver_id: request.receiver_id,
            atomic_amount,
        })
    }

    /// Convert a human amount at this network's scale.
    pub fn to_atomic_units(&self, amount: &HumanAmount) -> Result<u128, RelayError> {
        amount
            .to_atomic_units(self.config.network.decimals)
            .map_err(RelayError::InvalidAmount)
    }

    /// Submit one transfer. Exactly one broadcast attempt, bounded by the
    /// configured timeout end to end.
    pub async fn submit(
        &self,
        credential: &SigningCredential,
        receiver_id: &AccountId,
        atomic_amount: u128,
    ) -> SubmissionResult {
        let limit = self.config.timeout;
        let deadline = Instant::now() + limit;

        let Ok(_guard) = timeout_at(deadline, self.locks.acquire(credential.account_id())).await
        else {
            return SubmissionResult::timed_out(limit, None);
        };

        let session = NetworkSession::open(self.rpc.as_ref(), credential, self.config.wait_until);

        let access_key = match timeout_at(deadline, session.access_key()).await {
            Ok(Ok(view)) => view,
            Ok(Err(err)) => return err.into(),
            Err(_) => return SubmissionResult::timed_out(limit, None),
        };

        let signed = match session.sign_transfer(&access_key, receiver_id, atomic_amount) {
            Ok(signed) => signed,
            Err(err) => return err.into(),
        };
        let tx_hash = signed.hash_base58();
        debug!(
            tx_hash = %tx_hash,
            nonce = signed.transaction.nonce,
            yocto = %atomic_amount,
            near = %format_amount(atomic_amount, self.config.network.decimals),
            "Broadcasting transfer"
        );

        match timeout_at(deadline, session.broadcast(&signed)).await {
            Err(_) => SubmissionResult::timed_out(limit, Some(&tx_hash)),
            Ok(Err(err)) if err.kind == FailureKind::Timeout => {
                SubmissionResult::timed_out(limit, Some(&tx_hash))
            }
            Ok(Err(err)) => err.into(),
            Ok(Ok(outcome)) => match outcome.failure {
                Some(failure) => SubmissionResult::Failure {
                    kind: failure.kind,
                    message: failure.message,
                    http_status: None,
                },
                None => SubmissionResult::Success {
                    transaction_hash: outcome.transaction_hash.unwrap_or(tx_hash),
                },
            },
        }
    }

    /// Ask the network about a previously broadcast transaction.
    pub async fn transaction_status(
        &self,
        tx_hash: &str,
        signer_id: &str,
    ) -> Result<TxOutcome, RelayError> {
        if decode_hash(tx_hash).is_none() {
            return Err(RelayError::invalid_field(
                "transactionHash",
                "is not a base58 transaction hash.",
            ));
        }
        let signer = AccountId::try_from(signer_id).map_err(|reason| {
            RelayError::invalid_field("signerId", format!("is not a valid account id ({reason})."))
        })?;

        match tokio::time::timeout(
            self.config.timeout,
            self.rpc.transaction_status(tx_hash, &signer),
        )
        .await
        {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(err)) if err.kind == FailureKind::UnknownTransaction => Err(
                RelayError::NotFound(format!("Transaction {tx_hash} is not known to the network.")),
            ),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => Err(RelayError::Timeout {
                message: format!(
                    "Timed out after {:?} waiting for transaction status.",
                    self.config.timeout
                ),
            }),
        }
    }
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::test_support::*;
    use super::*;
    use crate::blockchain::{signing::test_keys::secret_for_seed, TxFailure};

    fn body(amount: Value) -> Value {
        json!({
            "signerId": "bot.testnet",
            "privateKey": secret_for_seed(1),
            "receiverId": "alice.testnet",
            "amount": amount,
        })
    }

    #[tokio::test]
    async fn successful_transfer_returns_hash() {
        let rpc = Arc::new(MockRpc::default());
        let relay = relay_with(rpc.clone());

        let receipt = relay.relay(&body(json!(50))).await.expect("transfer succeeds");

        assert_eq!(receipt.transaction_hash, TX_HASH);
        assert_eq!(receipt.atomic_amount, 50 * 10u128.pow(24));
        assert_eq!(receipt.receiver_id.as_str(), "alice.testnet");
        assert_eq!(rpc.calls(), vec!["view_access_key", "send_transaction"]);
        assert_eq!(*rpc.sent_nonces.lock().unwrap(), vec![11]);
    }

    #[tokio::test]
    async fn fractional_amount_is_converted_exactly() {
        let rpc = Arc::new(MockRpc::default());
        let relay = relay_with(rpc);

        let receipt = relay.relay(&body(json!(1.5))).await.unwrap();
        assert_eq!(receipt.atomic_amount, 1_500_000_000_000_000_000_000_000);
    }

    #[tokio::test]
    async fn negative_amount_is_rejected_before_network() {
        let rpc = Arc::new(MockRpc::default());
        let relay = relay_with(rpc.clone());

        let err = relay.relay(&body(json!(-5))).await.unwrap_err();
        assert_eq!(err.to_string(), "amount must be a positive number.");
        assert!(rpc.calls().is_empty());
    }

    #[tokio::test]
    async fn excess_precision_is_invalid_amount() {
        let rpc = Arc::new(MockRpc::default());
        let relay = relay_with(rpc.clone());

        let err = relay.relay(&body(json!(1e-25))).await.unwrap_err();
        assert!(matches!(err, RelayError::InvalidAmount(_)));
        assert!(rpc.calls().is_empty());
    }

    #[tokio::test]
    async fn undecodable_key_never_reaches_network() {
        let rpc = Arc::new(MockRpc::default());
        let relay = relay_with(rpc.clone());

        let mut request = body(json!(50));
        request["privateKey"] = json!("ed25519:3xMpQ");

        let err = relay.relay(&request).await.unwrap_err();
        assert!(matches!(err, RelayError::InvalidCredential(_)));
        assert!(!err.to_string().contains("3xMpQ"));
        assert!(rpc.calls().is_empty());
    }

    #[tokio::test]
    async fn insufficient_balance_reports_network_reason() {
        let reason = "Sender bot.testnet does not have enough balance 1 for operation costing 50";
        let rpc = Arc::new(MockRpc {
            send: SendBehavior::Reject(
                NearRpcError::new(FailureKind::InsufficientBalance, reason).with_status(Some(200)),
            ),
            ..MockRpc::default()
        });
        let relay = relay_with(rpc);

        let err = relay.relay(&body(json!(50))).await.unwrap_err();
        assert_eq!(
            err,
            RelayError::Network {
                kind: FailureKind::InsufficientBalance,
                message: reason.to_string(),
                http_status: Some(200),
            }
        );
    }

    #[tokio::test]
    async fn execution_failure_is_a_network_failure() {
        let rpc = Arc::new(MockRpc {
            send: SendBehavior::ExecutionFailure(TxFailure {
                kind: FailureKind::AccountNotFound,
                message: "Can't complete the action because account alice.testnet doesn't exist"
                    .into(),
            }),
            ..MockRpc::default()
        });
        let relay = relay_with(rpc);

        let err = relay.relay(&body(json!(50))).await.unwrap_err();
        assert_eq!(err.kind(), "account_not_found");
        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn unknown_signer_is_reported() {
        let rpc = Arc::new(MockRpc {
            access_key_error: Some(NearRpcError::new(
                FailureKind::AccountNotFound,
                "Account bot.testnet does not exist",
            )),
            ..MockRpc::default()
        });
        let relay = relay_with(rpc.clone());

        let err = relay.relay(&body(json!(50))).await.unwrap_err();
        assert_eq!(err.to_string(), "Account bot.testnet does not exist");
        assert_eq!(rpc.calls(), vec!["view_access_key"]);
    }

    #[tokio::test]
    async fn function_call_key_cannot_transfer() {
        let rpc = Arc::new(MockRpc {
            full_access: false,
            ..MockRpc::default()
        });
        let relay = relay_with(rpc.clone());

        let err = relay.relay(&body(json!(50))).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_transaction");
        assert_eq!(rpc.calls(), vec!["view_access_key"]);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_broadcast_times_out_with_hash() {
        let rpc = Arc::new(MockRpc {
            send: SendBehavior::Hang,
            ..MockRpc::default()
        });
        let relay = relay_with(rpc.clone());

        let err = relay.relay(&body(json!(50))).await.unwrap_err();
        let RelayError::Timeout { message } = &err else {
            panic!("expected timeout, got {err:?}");
        };
        assert!(message.starts_with("Timed out after 30s"));
        assert!(message.contains("check its status before retrying"));
        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        // One attempt only.
        assert_eq!(rpc.calls(), vec!["view_access_key", "send_transaction"]);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_access_key_lookup_times_out_without_hash() {
        let rpc = Arc::new(MockRpc {
            access_key_hang: true,
            ..MockRpc::default()
        });
        let relay = relay_with(rpc.clone());

        let err = relay.relay(&body(json!(50))).await.unwrap_err();
        assert_eq!(
            err,
            RelayError::Timeout {
                message: "Timed out after 30s waiting for the network.".to_string(),
            }
        );
        assert_eq!(rpc.calls(), vec!["view_access_key"]);
    }

    #[tokio::test(start_paused = true)]
    async fn lock_wait_past_deadline_times_out() {
        let rpc = Arc::new(MockRpc::default());
        let relay = relay_with(rpc.clone());

        let signer = AccountId::try_from("bot.testnet").unwrap();
        let _held = relay.locks.acquire(&signer).await;

        let err = relay.relay(&body(json!(50))).await.unwrap_err();
        assert_eq!(
            err,
            RelayError::Timeout {
                message: "Timed out after 30s waiting for the network.".to_string(),
            }
        );
        assert!(rpc.calls().is_empty());
    }

    #[tokio::test]
    async fn key_with_unknown_prefix_is_not_echoed() {
        let rpc = Arc::new(MockRpc::default());
        let relay = relay_with(rpc.clone());

        let secret = secret_for_seed(1);
        let bare = secret.trim_start_matches("ed25519:").to_string();
        let mut request = body(json!(50));
        request["privateKey"] = json!(format!("{bare}:pub"));

        let err = relay.relay(&request).await.unwrap_err();
        assert!(matches!(err, RelayError::InvalidCredential(_)));
        assert!(!err.to_string().contains(&bare));
        assert!(rpc.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_message_differs_from_rejection() {
        let hung = relay_with(Arc::new(MockRpc {
            send: SendBehavior::Hang,
            ..MockRpc::default()
        }));
        let rejected = relay_with(Arc::new(MockRpc {
            send: SendBehavior::Reject(NearRpcError::new(
                FailureKind::InsufficientBalance,
                "not enough balance",
            )),
            ..MockRpc::default()
        }));

        let timeout = hung.relay(&body(json!(50))).await.unwrap_err();
        let rejection = rejected.relay(&body(json!(50))).await.unwrap_err();
        assert_ne!(timeout.to_string(), rejection.to_string());
        assert_eq!(timeout.kind(), "timeout");
        assert_eq!(rejection.kind(), "insufficient_balance");
    }

    #[tokio::test]
    async fn concurrent_calls_for_one_signer_are_serialized() {
        let rpc = Arc::new(MockRpc {
            send_delay: Duration::from_millis(20),
            ..MockRpc::default()
        });
        let relay = Arc::new(relay_with(rpc.clone()));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let relay = Arc::clone(&relay);
            handles.push(tokio::spawn(async move {
                relay.relay(&body(json!(1))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().expect("every transfer succeeds");
        }

        assert_eq!(*rpc.sent_nonces.lock().unwrap(), vec![11, 12, 13, 14]);
    }

    #[tokio::test]
    async fn status_lookup_validates_inputs() {
        let relay = relay_with(Arc::new(MockRpc::default()));

        let err = relay
            .transaction_status("not-a-hash", "bot.testnet")
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidField { field: "transactionHash", .. }));

        let outcome = relay
            .transaction_status(TX_HASH, "bot.testnet")
            .await
            .unwrap();
        assert_eq!(outcome.execution_status, TxExecutionStatus::Final);
    }

    #[tokio::test]
    async fn unknown_transaction_is_not_found() {
        let relay = relay_with(Arc::new(MockRpc {
            status_error: Some(NearRpcError::new(
                FailureKind::UnknownTransaction,
                "Transaction is not known to the network",
            )),
            ..MockRpc::default()
        }));

        let err = relay
            .transaction_status(TX_HASH, "bot.testnet")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }
}
