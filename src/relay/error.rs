// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relay error taxonomy.

use axum::http::StatusCode;

use crate::blockchain::{AmountError, FailureKind, KeyError, NearRpcError};

/// Everything that can stop a transfer.
///
/// Input problems map to 400, network problems to 500. No variant ever
/// carries the secret key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("Missing required field: {0}.")]
    MissingField(&'static str),

    #[error("{field} {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    #[error("Invalid private key: {0}")]
    InvalidCredential(#[from] KeyError),

    #[error("Invalid amount: {0}")]
    InvalidAmount(AmountError),

    #[error("{message}")]
    Network {
        kind: FailureKind,
        message: String,
        http_status: Option<u16>,
    },

    #[error("{message}")]
    Timeout { message: String },

    #[error("{0}")]
    NotFound(String),
}

impl RelayError {
    pub fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingField(_)
            | Self::InvalidField { .. }
            | Self::InvalidCredential(_)
            | Self::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Network { .. } | Self::Timeout { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "missing_field",
            Self::InvalidField { .. } => "invalid_field",
            Self::InvalidCredential(_) => "invalid_credential",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::Network { kind, .. } => kind.as_str(),
            Self::Timeout { .. } => "timeout",
            Self::NotFound(_) => "not_found",
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Network { http_status, .. } => *http_status,
            _ => None,
        }
    }
}

impl From<NearRpcError> for RelayError {
    fn from(err: NearRpcError) -> Self {
        match err.kind {
            FailureKind::Timeout => Self::Timeout {
                message: err.message,
            },
            kind => Self::Network {
                kind,
                message: err.message,
                http_status: err.http_status,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_client_errors() {
        assert_eq!(
            RelayError::MissingField("amount").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::InvalidCredential(KeyError::InvalidEncoding).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::InvalidAmount(AmountError::TooPrecise(24)).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn network_errors_are_server_errors() {
        let err = RelayError::Network {
            kind: FailureKind::InsufficientBalance,
            message: "not enough".into(),
            http_status: Some(200),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), "insufficient_balance");
        assert_eq!(err.http_status(), Some(200));

        let timeout = RelayError::Timeout {
            message: "slow".into(),
        };
        assert_eq!(timeout.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(timeout.http_status(), None);
    }

    #[test]
    fn messages_name_the_field() {
        assert_eq!(
            RelayError::MissingField("receiverId").to_string(),
            "Missing required field: receiverId."
        );
        assert_eq!(
            RelayError::invalid_field("amount", "must be a positive number.").to_string(),
            "amount must be a positive number."
        );
    }
}
