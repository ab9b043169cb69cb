// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! NEAR Transfer Relay - Sign-and-Send Microservice
//!
//! A stateless HTTP relay that takes a NEAR account's secret key, signs a
//! native NEAR transfer with it and broadcasts the transaction. The key
//! lives only for the duration of one request.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `blockchain` - NEAR keys, transactions and JSON-RPC
//! - `client` - Client for a deployed relay
//! - `relay` - Validation, amount conversion and submission pipeline

pub mod api;
pub mod blockchain;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod relay;
pub mod state;
