// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! NEAR protocol integration.
//!
//! This module provides functionality for:
//! - Materializing ed25519 signing keys from NEAR secret key strings
//! - Exact conversion between NEAR and yoctoNEAR
//! - Building, hashing and signing transfer transactions
//! - JSON-RPC access to a NEAR node

pub mod client;
pub mod signing;
pub mod transactions;
pub mod types;

pub use client::{
    AccessKeyView, FailureKind, JsonRpcClient, NearRpc, NearRpcError, TxFailure, TxOutcome,
};
pub use signing::{materialize, KeyError, PublicKey, SigningCredential};
pub use transactions::{format_amount, AmountError, HumanAmount, SignedTransaction, Transaction};
pub use types::*;
