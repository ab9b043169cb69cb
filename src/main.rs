// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{process::ExitCode, sync::Arc};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use near_transfer_relay::{
    api::router,
    blockchain::JsonRpcClient,
    config::{RelayConfig, ServerConfig},
    logging::init_logging,
    relay::TransferRelay,
    state::AppState,
};

/// Time allowed for in-flight requests after a shutdown signal.
const SHUTDOWN_GRACE: std::time::Duration = std::time::Duration::from_secs(35);

#[tokio::main]
async fn main() -> ExitCode {
    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let server_config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid server configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(server_config.log_format);

    let relay_config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid relay configuration");
            return ExitCode::FAILURE;
        }
    };

    let rpc = match JsonRpcClient::new(relay_config.rpc_url.clone(), relay_config.timeout) {
        Ok(rpc) => rpc,
        Err(e) => {
            error!(error = %e, "Failed to create RPC client");
            return ExitCode::FAILURE;
        }
    };

    info!(
        network = relay_config.network.network_id,
        rpc_url = %relay_config.rpc_url,
        wait_until = %relay_config.wait_until,
        timeout = ?relay_config.timeout,
        "Relay configured"
    );

    let app = router(AppState::new(TransferRelay::new(relay_config, Arc::new(rpc))));

    let shutdown = CancellationToken::new();
    let handle = Handle::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));
    {
        let handle = handle.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown.cancelled().await;
            info!("Shutdown signal received, draining connections");
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        });
    }

    let addr = server_config.bind;
    let served = match &server_config.tls {
        Some(tls) => {
            let tls_config = match RustlsConfig::from_pem_file(&tls.cert, &tls.key).await {
                Ok(config) => config,
                Err(e) => {
                    error!(error = %e, cert = %tls.cert.display(), "Failed to load TLS certificate");
                    return ExitCode::FAILURE;
                }
            };
            info!("NEAR transfer relay listening on https://{addr} (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
        None => {
            info!("NEAR transfer relay listening on http://{addr} (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
    };

    match served {
        Ok(()) => {
            info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    shutdown.cancel();
}
