// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! NEAR JSON-RPC client.
//!
//! [`NearRpc`] is the seam between the relay and the network. The production
//! implementation is [`JsonRpcClient`]; tests substitute an in-memory one.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use super::signing::PublicKey;
use super::types::{AccountId, TxExecutionStatus};

/// What went wrong talking to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Endpoint unreachable or connection dropped
    Connection,
    /// No answer within the submission bound
    Timeout,
    /// Non-2xx HTTP response without a JSON-RPC error body
    Http,
    AccountNotFound,
    AccessKeyNotFound,
    InsufficientBalance,
    /// Rejected by validators before inclusion
    InvalidTransaction,
    /// Included, but the transfer action failed
    ExecutionFailed,
    UnknownTransaction,
    /// Any other JSON-RPC error
    Rpc,
    /// Response did not have the expected shape
    InvalidResponse,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Timeout => "timeout",
            Self::Http => "http",
            Self::AccountNotFound => "account_not_found",
            Self::AccessKeyNotFound => "access_key_not_found",
            Self::InsufficientBalance => "insufficient_balance",
            Self::InvalidTransaction => "invalid_transaction",
            Self::ExecutionFailed => "execution_failed",
            Self::UnknownTransaction => "unknown_transaction",
            Self::Rpc => "rpc",
            Self::InvalidResponse => "invalid_response",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the RPC layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct NearRpcError {
    pub kind: FailureKind,
    pub message: String,
    /// HTTP status of the response, when one was received
    pub http_status: Option<u16>,
}

impl NearRpcError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            http_status: None,
        }
    }

    pub fn with_status(mut self, status: Option<u16>) -> Self {
        self.http_status = status;
        self
    }

    fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidResponse, message)
    }

    fn from_transport(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        let kind = if err.is_timeout() {
            FailureKind::Timeout
        } else if status.is_some() {
            FailureKind::Http
        } else {
            FailureKind::Connection
        };
        Self::new(kind, format!("RPC request failed: {err}")).with_status(status)
    }
}

/// Access key state needed to build a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessKeyView {
    pub nonce: u64,
    /// Recent block hash the transaction is anchored to
    pub block_hash: [u8; 32],
    pub full_access: bool,
}

/// A failed transaction execution reported by the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// What the network reports about a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    /// Hash as reported by the network, if the response carried one
    pub transaction_hash: Option<String>,
    pub execution_status: TxExecutionStatus,
    /// Set when the transaction executed and failed
    pub failure: Option<TxFailure>,
}

/// Operations the relay needs from a NEAR node.
#[async_trait]
pub trait NearRpc: Send + Sync {
    /// Look up an access key at final finality.
    async fn view_access_key(
        &self,
        account_id: &AccountId,
        public_key: &PublicKey,
    ) -> Result<AccessKeyView, NearRpcError>;

    /// Broadcast a base64 Borsh signed transaction and wait for `wait_until`.
    async fn send_transaction(
        &self,
        signed_tx_base64: &str,
        wait_until: TxExecutionStatus,
    ) -> Result<TxOutcome, NearRpcError>;

    /// Current status of a transaction, without waiting.
    async fn transaction_status(
        &self,
        tx_hash: &str,
        sender_id: &AccountId,
    ) -> Result<TxOutcome, NearRpcError>;

    /// Chain id reported by the node's `status` endpoint.
    async fn chain_id(&self) -> Result<String, NearRpcError>;
}

/// JSON-RPC over HTTP against a NEAR node.
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    rpc_url: url::Url,
    http: Client,
}

impl JsonRpcClient {
    /// Create a client for the given endpoint.
    ///
    /// `timeout` bounds each individual HTTP request.
    pub fn new(rpc_url: url::Url, timeout: Duration) -> Result<Self, NearRpcError> {
        let http = Client::builder().timeout(timeout).build().map_err(|e| {
            NearRpcError::new(
                FailureKind::Connection,
                format!("failed to build HTTP client: {e}"),
            )
        })?;

        Ok(Self { rpc_url, http })
    }

    pub fn rpc_url(&self) -> &url::Url {
        &self.rpc_url
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, NearRpcError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": "relay",
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(self.rpc_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(NearRpcError::from_transport)?;

        let status = response.status();
        let http_status = Some(status.as_u16());

        let payload: Value = match response.json().await {
            Ok(payload) => payload,
            Err(_) if !status.is_success() => {
                return Err(NearRpcError::new(
                    FailureKind::Http,
                    format!("RPC endpoint returned HTTP {status}"),
                )
                .with_status(http_status));
            }
            Err(e) => {
                return Err(
                    NearRpcError::invalid_response(format!("RPC response is not JSON: {e}"))
                        .with_status(http_status),
                );
            }
        };

        if let Some(error) = payload.get("error") {
            return Err(classify_rpc_error(error).with_status(http_status));
        }

        if !status.is_success() {
            return Err(NearRpcError::new(
                FailureKind::Http,
                format!("RPC endpoint returned HTTP {status}"),
            )
            .with_status(http_status));
        }

        payload.get("result").cloned().ok_or_else(|| {
            NearRpcError::invalid_response("RPC response has no result").with_status(http_status)
        })
    }
}

#[async_trait]
impl NearRpc for JsonRpcClient {
    async fn view_access_key(
        &self,
        account_id: &AccountId,
        public_key: &PublicKey,
    ) -> Result<AccessKeyView, NearRpcError> {
        let result = self
            .call(
                "query",
                json!({
                    "request_type": "view_access_key",
                    "finality": "final",
                    "account_id": account_id.as_str(),
                    "public_key": public_key.to_string(),
                }),
            )
            .await?;

        parse_access_key(&result)
    }

    async fn send_transaction(
        &self,
        signed_tx_base64: &str,
        wait_until: TxExecutionStatus,
    ) -> Result<TxOutcome, NearRpcError> {
        let result = self
            .call(
                "send_tx",
                json!({
                    "signed_tx_base64": signed_tx_base64,
                    "wait_until": wait_until.as_str(),
                }),
            )
            .await?;

        Ok(parse_tx_outcome(&result, wait_until))
    }

    async fn transaction_status(
        &self,
        tx_hash: &str,
        sender_id: &AccountId,
    ) -> Result<TxOutcome, NearRpcError> {
        let result = self
            .call(
                "tx",
                json!({
                    "tx_hash": tx_hash,
                    "sender_account_id": sender_id.as_str(),
                    "wait_until": TxExecutionStatus::None.as_str(),
                }),
            )
            .await?;

        Ok(parse_tx_outcome(&result, TxExecutionStatus::None))
    }

    async fn chain_id(&self) -> Result<String, NearRpcError> {
        let result = self.call("status", json!([])).await?;
        result
            .get("chain_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| NearRpcError::invalid_response("status response has no chain_id"))
    }
}

fn parse_access_key(result: &Value) -> Result<AccessKeyView, NearRpcError> {
    // Older nodes answer query errors inside `result`.
    if let Some(error) = result.get("error").and_then(Value::as_str) {
        let kind = if error.contains("access key") && error.contains("does not exist") {
            FailureKind::AccessKeyNotFound
        } else if error.contains("does not exist") {
            FailureKind::AccountNotFound
        } else {
            FailureKind::Rpc
        };
        return Err(NearRpcError::new(kind, error));
    }

    let nonce = result
        .get("nonce")
        .and_then(Value::as_u64)
        .ok_or_else(|| NearRpcError::invalid_response("access key response has no nonce"))?;

    let block_hash = result
        .get("block_hash")
        .and_then(Value::as_str)
        .ok_or_else(|| NearRpcError::invalid_response("access key response has no block_hash"))?;
    let block_hash = decode_hash(block_hash)
        .ok_or_else(|| NearRpcError::invalid_response("block_hash is not a base58 32-byte hash"))?;

    let full_access = result
        .get("permission")
        .and_then(Value::as_str)
        .map(|p| p == "FullAccess")
        .unwrap_or(false);

    Ok(AccessKeyView {
        nonce,
        block_hash,
        full_access,
    })
}

/// Decode a base58 32-byte hash.
pub fn decode_hash(encoded: &str) -> Option<[u8; 32]> {
    let bytes = bs58::decode(encoded).into_vec().ok()?;
    bytes.try_into().ok()
}

fn parse_tx_outcome(result: &Value, requested: TxExecutionStatus) -> TxOutcome {
    let execution_status = result
        .get("final_execution_status")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or(requested);

    let transaction_hash = result
        .pointer("/transaction/hash")
        .or_else(|| result.pointer("/transaction_outcome/id"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let failure = result.pointer("/status/Failure").map(|err| {
        let (kind, message) = describe_tx_error(err);
        TxFailure { kind, message }
    });

    TxOutcome {
        transaction_hash,
        execution_status,
        failure,
    }
}

/// Classify a JSON-RPC `error` object.
fn classify_rpc_error(error: &Value) -> NearRpcError {
    let cause = error.pointer("/cause/name").and_then(Value::as_str);
    let info = error.pointer("/cause/info");

    match cause {
        Some("UNKNOWN_ACCOUNT") => {
            let account = info
                .and_then(|i| i.get("requested_account_id"))
                .and_then(Value::as_str)
                .unwrap_or("signer");
            NearRpcError::new(
                FailureKind::AccountNotFound,
                format!("Account {account} does not exist"),
            )
        }
        Some("UNKNOWN_ACCESS_KEY") => {
            let key = info
                .and_then(|i| i.get("public_key"))
                .and_then(Value::as_str)
                .unwrap_or("for the signer");
            NearRpcError::new(
                FailureKind::AccessKeyNotFound,
                format!("Access key {key} does not exist"),
            )
        }
        Some("INVALID_TRANSACTION") => {
            let details = error.get("data").or(info).unwrap_or(error);
            let (kind, message) = describe_tx_error(details);
            NearRpcError::new(kind, message)
        }
        Some("TIMEOUT_ERROR") => NearRpcError::new(
            FailureKind::Timeout,
            "Timed out waiting for the network to include the transaction",
        ),
        Some("UNKNOWN_TRANSACTION") => NearRpcError::new(
            FailureKind::UnknownTransaction,
            "Transaction is not known to the network",
        ),
        _ => {
            let message = error
                .get("data")
                .and_then(Value::as_str)
                .or_else(|| error.get("message").and_then(Value::as_str))
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            NearRpcError::new(FailureKind::Rpc, message)
        }
    }
}

/// Turn a `TxExecutionError` payload into a failure kind and readable reason.
fn describe_tx_error(err: &Value) -> (FailureKind, String) {
    if let Some((name, body)) = find_key(err, "InvalidTxError").and_then(first_entry) {
        return match name {
            "NotEnoughBalance" => (
                FailureKind::InsufficientBalance,
                format!(
                    "Sender {} does not have enough balance {} for operation costing {}",
                    field(body, "signer_id"),
                    field(body, "balance"),
                    field(body, "cost"),
                ),
            ),
            "LackBalanceForState" => (
                FailureKind::InsufficientBalance,
                format!(
                    "Account {} would not have enough balance to cover storage, required {}",
                    field(body, "signer_id"),
                    field(body, "amount"),
                ),
            ),
            "InvalidNonce" => (
                FailureKind::InvalidTransaction,
                format!(
                    "Transaction nonce {} must be larger than nonce of the used access key {}",
                    field(body, "tx_nonce"),
                    field(body, "ak_nonce"),
                ),
            ),
            "Expired" => (
                FailureKind::InvalidTransaction,
                "Transaction has expired".to_string(),
            ),
            "InvalidSignature" => (
                FailureKind::InvalidTransaction,
                "Transaction is not signed with the given public key".to_string(),
            ),
            other => (
                FailureKind::InvalidTransaction,
                format!("Invalid transaction: {other} {body}"),
            ),
        };
    }

    if let Some((name, body)) = find_key(err, "ActionError")
        .and_then(|action| action.get("kind"))
        .and_then(first_entry)
    {
        return match name {
            "AccountDoesNotExist" => (
                FailureKind::AccountNotFound,
                format!(
                    "Can't complete the action because account {} doesn't exist",
                    field(body, "account_id"),
                ),
            ),
            "LackBalanceForState" => (
                FailureKind::InsufficientBalance,
                format!(
                    "Receiver {} needs {} to cover storage",
                    field(body, "account_id"),
                    field(body, "amount"),
                ),
            ),
            other => (
                FailureKind::ExecutionFailed,
                format!("Transaction action failed: {other} {body}"),
            ),
        };
    }

    (FailureKind::ExecutionFailed, format!("Transaction failed: {err}"))
}

/// Depth-first search for an object key.
fn find_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map
            .get(key)
            .or_else(|| map.values().find_map(|v| find_key(v, key))),
        Value::Array(items) => items.iter().find_map(|v| find_key(v, key)),
        _ => None,
    }
}

static NO_BODY: Value = Value::Null;

/// First `(name, body)` of an externally tagged enum value.
///
/// Unit variants come back as plain strings.
fn first_entry(value: &Value) -> Option<(&str, &Value)> {
    match value {
        Value::Object(map) => map.iter().next().map(|(k, v)| (k.as_str(), v)),
        Value::String(s) => Some((s.as_str(), &NO_BODY)),
        _ => None,
    }
}

fn field(body: &Value, name: &str) -> String {
    match body.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "?".to_string(),
    }
}
