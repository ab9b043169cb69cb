// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    api::health::{HealthChecks, HealthResponse, ReadyResponse},
    blockchain::FailureKind,
    models::{
        ErrorResponse, SendRequest, SuccessResponse, TransactionStatusResponse, TxOutcomeKind,
    },
    state::AppState,
};

pub mod health;
pub mod relay;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/sign-and-send",
            post(relay::sign_and_send).fallback(relay::method_not_allowed),
        )
        .route("/transactions/{tx_hash}", get(relay::transaction_status))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    // Preflight requests are answered here with an empty 200.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        relay::sign_and_send,
        relay::transaction_status,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            SendRequest,
            SuccessResponse,
            ErrorResponse,
            TransactionStatusResponse,
            TxOutcomeKind,
            FailureKind,
            ReadyResponse,
            HealthChecks,
            HealthResponse
        )
    ),
    tags(
        (name = "Relay", description = "Sign and broadcast NEAR transfers"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
