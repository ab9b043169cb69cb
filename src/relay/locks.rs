// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-account submission serialization.
//!
//! Two submissions for the same signer would otherwise read the same access
//! key nonce and one of them would be rejected. Holding an [`AccountGuard`]
//! from nonce lookup until broadcast completes keeps them ordered. Entries
//! are dropped from the map once nobody holds or waits on them.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::blockchain::AccountId;

#[derive(Debug, Clone, Default)]
pub struct AccountLocks {
    inner: Arc<DashMap<AccountId, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other submission for `account` is in flight.
    pub async fn acquire(&self, account: &AccountId) -> AccountGuard {
        let lock = self.inner.entry(account.clone()).or_default().clone();
        let guard = lock.lock_owned().await;

        AccountGuard {
            account: account.clone(),
            locks: Arc::clone(&self.inner),
            guard: Some(guard),
        }
    }

    /// Number of accounts with a held or awaited lock.
    pub fn active(&self) -> usize {
        self.inner.len()
    }
}

/// Exclusive right to submit for one account. Released on drop.
#[derive(Debug)]
pub struct AccountGuard {
    account: AccountId,
    locks: Arc<DashMap<AccountId, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for AccountGuard {
    fn drop(&mut self) {
        // Release first so the strong count below only counts waiters.
        self.guard.take();
        self.locks
            .remove_if(&self.account, |_, lock| Arc::strong_count(lock) == 1);
    }
}
