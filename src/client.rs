// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP client for a deployed relay.
//!
//! Used by automation steps that hold a NEAR credential and want a transfer
//! signed and sent. Every non-2xx answer is an error; there is no partial
//! success.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::models::SendRequest;

/// Blockchain calls can take a while to be acknowledged.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum SignerClientError {
    #[error("Signer Error ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Signer Error (Unknown): {0}")]
    Transport(String),
}

/// Posts transfer requests to a relay endpoint.
#[derive(Debug, Clone)]
pub struct SignerClient {
    endpoint: url::Url,
    http: Client,
}

impl SignerClient {
    pub fn new(endpoint: url::Url) -> Result<Self, SignerClientError> {
        Self::with_timeout(endpoint, DEFAULT_CLIENT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: url::Url, timeout: Duration) -> Result<Self, SignerClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SignerClientError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { endpoint, http })
    }

    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }

    /// Submit one transfer and return the relay's JSON answer.
    pub async fn send(&self, request: &SendRequest) -> Result<Value, SignerClientError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| match e.status() {
                Some(status) => SignerClientError::Rejected {
                    status: status.as_u16(),
                    message: e.to_string(),
                },
                None => SignerClientError::Transport(e.to_string()),
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SignerClientError::Transport(format!("failed to read response: {e}")))?;
        let body: Option<Value> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let message = body
                .as_ref()
                .and_then(|b| b.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    if text.trim().is_empty() {
                        status
                            .canonical_reason()
                            .unwrap_or("Signer API call failed")
                            .to_string()
                    } else {
                        text.clone()
                    }
                });
            return Err(SignerClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        body.ok_or_else(|| {
            SignerClientError::Transport(format!("relay returned a non-JSON body (HTTP {status})"))
        })
    }
}
