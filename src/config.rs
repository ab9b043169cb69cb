// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup into explicit values that are handed to the relay.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `NEAR_NETWORK` | `testnet` or `mainnet` | `testnet` |
//! | `NEAR_RPC_URL` | Override of the network's RPC endpoint | network default |
//! | `NEAR_WAIT_UNTIL` | Execution status `send_tx` waits for | `EXECUTED_OPTIMISTIC` |
//! | `RELAY_TIMEOUT_SECS` | Upper bound for one submission | `30` |
//! | `TLS_CERT_PATH` | PEM certificate chain; enables HTTPS with `TLS_KEY_PATH` | unset |
//! | `TLS_KEY_PATH` | PEM private key for HTTPS | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use crate::blockchain::{network_by_id, NetworkConfig, TxExecutionStatus, NEAR_TESTNET};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const NEAR_NETWORK_ENV: &str = "NEAR_NETWORK";
pub const NEAR_RPC_URL_ENV: &str = "NEAR_RPC_URL";
pub const NEAR_WAIT_UNTIL_ENV: &str = "NEAR_WAIT_UNTIL";
pub const RELAY_TIMEOUT_SECS_ENV: &str = "RELAY_TIMEOUT_SECS";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Submission bound, matching the 30 s the upstream caller waits.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_WAIT_UNTIL: TxExecutionStatus = TxExecutionStatus::ExecutedOptimistic;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("NEAR_NETWORK must be `testnet` or `mainnet`, got `{0}`")]
    UnknownNetwork(String),

    #[error("NEAR_RPC_URL is not a valid URL: {0}")]
    InvalidRpcUrl(String),

    #[error("NEAR_WAIT_UNTIL: {0}")]
    InvalidWaitUntil(String),

    #[error("RELAY_TIMEOUT_SECS must be a positive integer, got `{0}`")]
    InvalidTimeout(String),

    #[error("PORT must be a port number, got `{0}`")]
    InvalidPort(String),

    #[error("invalid bind address `{0}`")]
    InvalidBindAddress(String),

    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    IncompleteTls,

    #[error("LOG_FORMAT must be `json` or `pretty`, got `{0}`")]
    InvalidLogFormat(String),
}

/// Everything the relay needs to reach the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub network: NetworkConfig,
    pub rpc_url: url::Url,
    pub wait_until: TxExecutionStatus,
    pub timeout: Duration,
}

impl RelayConfig {
    /// Configuration for a network with its default endpoint.
    pub fn for_network(network: NetworkConfig) -> Result<Self, ConfigError> {
        let rpc_url = parse_rpc_url(network.rpc_url)?;
        Ok(Self {
            network,
            rpc_url,
            wait_until: DEFAULT_WAIT_UNTIL,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let network = match lookup(NEAR_NETWORK_ENV) {
            Some(raw) => network_by_id(&raw).ok_or(ConfigError::UnknownNetwork(raw))?,
            None => NEAR_TESTNET,
        };

        let mut config = Self::for_network(network)?;

        if let Some(raw) = lookup(NEAR_RPC_URL_ENV) {
            config.rpc_url = parse_rpc_url(&raw)?;
        }

        if let Some(raw) = lookup(NEAR_WAIT_UNTIL_ENV) {
            config.wait_until = raw.parse().map_err(ConfigError::InvalidWaitUntil)?;
        }

        if let Some(raw) = lookup(RELAY_TIMEOUT_SECS_ENV) {
            let secs: u64 = raw
                .trim()
                .parse()
                .ok()
                .filter(|s| *s > 0)
                .ok_or(ConfigError::InvalidTimeout(raw))?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_rpc_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw
        .parse()
        .map_err(|e: url::ParseError| ConfigError::InvalidRpcUrl(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidRpcUrl(format!(
            "unsupported scheme `{other}`"
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Certificate and key for serving HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup(PORT_ENV) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let bind: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddress(format!("{host}:{port}")))?;

        let tls = match (lookup(TLS_CERT_PATH_ENV), lookup(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTls),
        };

        let log_format = match lookup(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(ConfigError::InvalidLogFormat(other.to_string())),
        };

        Ok(Self {
            bind,
            tls,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::NEAR_MAINNET;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn relay_defaults_to_testnet() {
        let config = RelayConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.network, NEAR_TESTNET);
        assert_eq!(config.rpc_url.as_str(), "https://rpc.testnet.near.org/");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.wait_until, TxExecutionStatus::ExecutedOptimistic);
    }

    #[test]
    fn relay_overrides_apply() {
        let config = RelayConfig::from_lookup(lookup(&[
            (NEAR_NETWORK_ENV, "mainnet"),
            (NEAR_RPC_URL_ENV, "http://localhost:3030"),
            (NEAR_WAIT_UNTIL_ENV, "included_final"),
            (RELAY_TIMEOUT_SECS_ENV, "5"),
        ]))
        .unwrap();
        assert_eq!(config.network, NEAR_MAINNET);
        assert_eq!(config.rpc_url.as_str(), "http://localhost:3030/");
        assert_eq!(config.wait_until, TxExecutionStatus::IncludedFinal);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn relay_rejects_bad_values() {
        assert_eq!(
            RelayConfig::from_lookup(lookup(&[(NEAR_NETWORK_ENV, "betanet")])).unwrap_err(),
            ConfigError::UnknownNetwork("betanet".into())
        );
        assert!(matches!(
            RelayConfig::from_lookup(lookup(&[(NEAR_RPC_URL_ENV, "ftp://x")])),
            Err(ConfigError::InvalidRpcUrl(_))
        ));
        assert_eq!(
            RelayConfig::from_lookup(lookup(&[(RELAY_TIMEOUT_SECS_ENV, "0")])).unwrap_err(),
            ConfigError::InvalidTimeout("0".into())
        );
    }

    #[test]
    fn server_defaults_and_tls_pairing() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.tls, None);
        assert_eq!(config.log_format, LogFormat::Pretty);

        assert_eq!(
            ServerConfig::from_lookup(lookup(&[(TLS_CERT_PATH_ENV, "/tmp/cert.pem")])).unwrap_err(),
            ConfigError::IncompleteTls
        );

        let config = ServerConfig::from_lookup(lookup(&[
            (PORT_ENV, "9000"),
            (LOG_FORMAT_ENV, "json"),
        ]))
        .unwrap();
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
