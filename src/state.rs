// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::relay::TransferRelay;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<TransferRelay>,
}

impl AppState {
    pub fn new(relay: TransferRelay) -> Self {
        Self {
            relay: Arc::new(relay),
        }
    }
}
