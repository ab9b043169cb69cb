// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign-and-send and transaction status endpoints.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use crate::{
    error::ApiError,
    models::{
        ErrorResponse, SendRequest, SuccessResponse, TransactionStatusQuery,
        TransactionStatusResponse,
    },
    relay::{validation::SIGNER_ID_FIELD, RelayError},
    state::AppState,
};

/// Sign a native NEAR transfer with the supplied key and broadcast it.
///
/// The key is used for this request only and is never stored or logged.
#[utoipa::path(
    post,
    path = "/api/sign-and-send",
    tag = "Relay",
    request_body = SendRequest,
    responses(
        (status = 200, description = "Transfer accepted by the network", body = SuccessResponse),
        (status = 400, description = "Invalid request, key or amount", body = ErrorResponse),
        (status = 405, description = "Method other than POST or OPTIONS", body = ErrorResponse),
        (status = 500, description = "Network failure or timeout", body = ErrorResponse)
    )
)]
pub async fn sign_and_send(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SuccessResponse>, ApiError> {
    let body: Value = serde_json::from_slice(&body)
        .map_err(|_| ApiError::bad_request("Request body must be valid JSON."))?;

    let receipt = state.relay.relay(&body).await?;
    Ok(Json(SuccessResponse::new(receipt.transaction_hash)))
}

/// Any method on the relay route other than POST or OPTIONS.
pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

/// Look up a previously broadcast transaction.
///
/// Use this after a timeout to find out whether the transfer landed before
/// sending it again.
#[utoipa::path(
    get,
    path = "/api/transactions/{tx_hash}",
    tag = "Relay",
    params(
        ("tx_hash" = String, Path, description = "Base58 transaction hash"),
        TransactionStatusQuery
    ),
    responses(
        (status = 200, description = "Transaction status", body = TransactionStatusResponse),
        (status = 400, description = "Malformed hash or signer id", body = ErrorResponse),
        (status = 404, description = "Transaction not known to the network", body = ErrorResponse),
        (status = 500, description = "Network failure", body = ErrorResponse)
    )
)]
pub async fn transaction_status(
    State(state): State<AppState>,
    Path(tx_hash): Path<String>,
    Query(query): Query<TransactionStatusQuery>,
) -> Result<Json<TransactionStatusResponse>, ApiError> {
    let signer_id = query
        .signer_id
        .ok_or(RelayError::MissingField(SIGNER_ID_FIELD))?;

    let outcome = state
        .relay
        .transaction_status(&tx_hash, &signer_id)
        .await?;

    Ok(Json(TransactionStatusResponse::from_outcome(
        &tx_hash, outcome,
    )))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::json;
    use tower::ServiceExt;

    use crate::api::router;
    use crate::blockchain::{signing::test_keys::secret_for_seed, FailureKind, NearRpcError};
    use crate::relay::test_support::{relay_with, MockRpc, SendBehavior, TX_HASH};
    use crate::state::AppState;

    fn app(rpc: MockRpc) -> Router {
        router(AppState::new(relay_with(Arc::new(rpc))))
    }

    fn post_json(body: String) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/sign-and-send")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    fn transfer(amount: &str) -> String {
        format!(
            r#"{{"signerId":"bot.testnet","privateKey":"{}","receiverId":"alice.testnet","amount":{amount}}}"#,
            secret_for_seed(7)
        )
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn successful_transfer_returns_hash() {
        let response = app(MockRpc::default())
            .oneshot(post_json(transfer("50")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"status": "success", "transactionHash": TX_HASH})
        );
    }

    #[tokio::test]
    async fn missing_field_is_bad_request() {
        let body = json!({
            "signerId": "bot.testnet",
            "privateKey": secret_for_seed(7),
            "receiverId": "alice.testnet"
        });
        let response = app(MockRpc::default())
            .oneshot(post_json(body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({"status": "error", "message": "Missing required field: amount."})
        );
    }

    #[tokio::test]
    async fn negative_amount_is_bad_request() {
        let response = app(MockRpc::default())
            .oneshot(post_json(transfer("-5")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["message"], "amount must be a positive number.");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let response = app(MockRpc::default())
            .oneshot(post_json("{not json".to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["status"], "error");
    }

    #[tokio::test]
    async fn network_rejection_is_server_error() {
        let rpc = MockRpc {
            send: SendBehavior::Reject(NearRpcError::new(
                FailureKind::InsufficientBalance,
                "Sender bot.testnet does not have enough balance",
            )),
            ..MockRpc::default()
        };
        let response = app(rpc).oneshot(post_json(transfer("50"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await["message"],
            "Sender bot.testnet does not have enough balance"
        );
    }

    #[tokio::test]
    async fn secret_never_echoed_on_bad_key() {
        let body = json!({
            "signerId": "bot.testnet",
            "privateKey": "ed25519:notbase58!!",
            "receiverId": "alice.testnet",
            "amount": 1
        });
        let response = app(MockRpc::default())
            .oneshot(post_json(body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(!body["message"].as_str().unwrap().contains("notbase58"));
    }

    #[tokio::test]
    async fn unknown_key_prefix_is_not_echoed() {
        let secret = secret_for_seed(1);
        let bare = secret.trim_start_matches("ed25519:");
        let body = json!({
            "signerId": "bot.testnet",
            "privateKey": format!("{bare}:x"),
            "receiverId": "alice.testnet",
            "amount": 1
        });
        let response = app(MockRpc::default())
            .oneshot(post_json(body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains(bare));
        assert!(text.contains("only ed25519 keys are accepted"));
    }

    #[tokio::test]
    async fn other_methods_are_rejected() {
        for method in [Method::GET, Method::PUT, Method::DELETE] {
            let request = Request::builder()
                .method(method.clone())
                .uri("/api/sign-and-send")
                .body(Body::empty())
                .unwrap();
            let response = app(MockRpc::default()).oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
            assert_eq!(
                json_body(response).await,
                json!({
                    "status": "error",
                    "message": "Method not allowed. Only POST requests are supported."
                })
            );
        }
    }

    #[tokio::test]
    async fn options_is_empty_ok_with_cors() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/sign-and-send")
            .header(header::ORIGIN, "https://app.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app(MockRpc::default()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn status_lookup_reports_outcome() {
        let request = Request::builder()
            .uri(format!("/api/transactions/{TX_HASH}?signerId=bot.testnet"))
            .body(Body::empty())
            .unwrap();
        let response = app(MockRpc::default()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["transactionHash"], TX_HASH);
        assert_eq!(body["executionStatus"], "FINAL");
        assert_eq!(body["outcome"], "succeeded");
    }

    #[tokio::test]
    async fn status_lookup_requires_signer() {
        let request = Request::builder()
            .uri(format!("/api/transactions/{TX_HASH}"))
            .body(Body::empty())
            .unwrap();
        let response = app(MockRpc::default()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["message"],
            "Missing required field: signerId."
        );
    }

    #[tokio::test]
    async fn unknown_transaction_is_not_found() {
        let rpc = MockRpc {
            status_error: Some(NearRpcError::new(
                FailureKind::UnknownTransaction,
                "Transaction doesn't exist",
            )),
            ..MockRpc::default()
        };
        let request = Request::builder()
            .uri(format!("/api/transactions/{TX_HASH}?signerId=bot.testnet"))
            .body(Body::empty())
            .unwrap();
        let response = app(rpc).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
