// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Send one NEAR transfer through a running relay.
//!
//! ```text
//! SIGNER_ACCOUNT_ID=bot.testnet SIGNER_PRIVATE_KEY=ed25519:... \
//!     relay-send alice.testnet 1.5
//! ```

use std::process::ExitCode;

use clap::Parser;
use near_transfer_relay::{client::SignerClient, models::SendRequest};

#[derive(Parser)]
#[command(name = "relay-send")]
#[command(about = "Sign and send a NEAR transfer through a relay", long_about = None)]
struct Cli {
    /// Relay endpoint
    #[arg(
        short,
        long,
        env = "RELAY_URL",
        default_value = "http://localhost:8080/api/sign-and-send"
    )]
    url: url::Url,

    /// Account that signs and pays
    #[arg(long, env = "SIGNER_ACCOUNT_ID")]
    signer_id: String,

    /// Secret key of the signer
    #[arg(long, env = "SIGNER_PRIVATE_KEY", hide_env_values = true)]
    private_key: String,

    /// Account that receives the funds
    receiver_id: String,

    /// Amount in NEAR (e.g. 1.5)
    amount: serde_json::Number,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let client = match SignerClient::new(cli.url) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let request = SendRequest {
        signer_id: cli.signer_id,
        private_key: cli.private_key,
        receiver_id: cli.receiver_id,
        amount: cli.amount,
    };

    match client.send(&request).await {
        Ok(body) => {
            println!("{body:#}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
