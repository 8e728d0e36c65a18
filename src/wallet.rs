// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Wallet ledger.
//!
//! The [`Ledger`] is the only authority over wallet balances. Each wallet is
//! guarded by its own mutex, so balance checks and the movements they guard
//! happen in one critical section per user while different users proceed
//! in parallel.
//!
//! # Example
//!
//! ```
//! use arena_ledger::{Ledger, MemoryJournal, UserId};
//! use std::sync::Arc;
//!
//! let ledger = Ledger::new(Arc::new(MemoryJournal::new()));
//! ledger.credit(UserId(1), 500).unwrap();
//! ledger.debit(UserId(1), 200).unwrap();
//! assert_eq!(ledger.balance(UserId(1)), 300);
//! ```

use crate::ArenaError;
use crate::base::{Amount, UserId};
use crate::journal::{ArenaEvent, Journal};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
struct WalletData {
    user_id: UserId,
    balance: Amount,
}

impl WalletData {
    fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            balance: 0,
        }
    }

    /// Balance after adding `amount`.
    fn credited(&self, amount: Amount) -> Result<Amount, ArenaError> {
        if amount == 0 {
            return Err(ArenaError::InvalidAmount);
        }
        self.balance
            .checked_add(amount)
            .ok_or(ArenaError::InvalidAmount)
    }

    /// Balance after removing `amount`.
    fn debited(&self, amount: Amount) -> Result<Amount, ArenaError> {
        if amount == 0 {
            return Err(ArenaError::InvalidAmount);
        }
        self.balance
            .checked_sub(amount)
            .ok_or(ArenaError::InsufficientFunds)
    }
}

/// A single user's wallet.
#[derive(Debug)]
struct Wallet {
    inner: Mutex<WalletData>,
}

impl Wallet {
    fn new(user_id: UserId) -> Self {
        Self {
            inner: Mutex::new(WalletData::new(user_id)),
        }
    }

    fn balance(&self) -> Amount {
        self.inner.lock().balance
    }
}

/// Point-in-time wallet balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WalletBalance {
    pub user: UserId,
    pub balance: Amount,
}

/// Owner of all wallet balances.
pub struct Ledger {
    wallets: DashMap<UserId, Arc<Wallet>>,
    journal: Arc<dyn Journal>,
}

impl Ledger {
    pub fn new(journal: Arc<dyn Journal>) -> Self {
        Self {
            wallets: DashMap::new(),
            journal,
        }
    }

    /// Current balance; users without a wallet hold zero.
    pub fn balance(&self, user: UserId) -> Amount {
        self.wallet(user).map_or(0, |wallet| wallet.balance())
    }

    /// Adds `amount` to the user's balance, opening the wallet if needed.
    ///
    /// Returns the new balance.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::InvalidAmount`] - `amount` is zero.
    /// - [`ArenaError::Storage`] - the journal refused the event.
    pub fn credit(&self, user: UserId, amount: Amount) -> Result<Amount, ArenaError> {
        self.credit_with(user, amount, |balance| ArenaEvent::Credited {
            user,
            amount,
            balance,
        })
    }

    /// Removes `amount` from the user's balance.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::InvalidAmount`] - `amount` is zero.
    /// - [`ArenaError::InsufficientFunds`] - balance is below `amount`.
    /// - [`ArenaError::Storage`] - the journal refused the event.
    pub fn debit(&self, user: UserId, amount: Amount) -> Result<Amount, ArenaError> {
        self.debit_with(user, amount, |balance| ArenaEvent::Debited {
            user,
            amount,
            balance,
        })
    }

    /// Reverses an earlier reservation. Same rules as [`Ledger::credit`].
    pub fn refund(&self, user: UserId, amount: Amount) -> Result<Amount, ArenaError> {
        self.credit_with(user, amount, |balance| ArenaEvent::Refunded {
            user,
            amount,
            balance,
        })
    }

    /// Credits `amount` and journals the event built from the new balance.
    pub(crate) fn credit_with<F>(
        &self,
        user: UserId,
        amount: Amount,
        event: F,
    ) -> Result<Amount, ArenaError>
    where
        F: FnOnce(Amount) -> ArenaEvent,
    {
        if amount == 0 {
            return Err(ArenaError::InvalidAmount);
        }
        let wallet = self.wallet_or_open(user);
        let mut data = wallet.inner.lock();
        let balance = data.credited(amount)?;
        self.journal.append(&event(balance))?;
        data.balance = balance;
        debug!(%user, amount, balance, "wallet credited");
        Ok(balance)
    }

    /// Debits `amount` and journals the event built from the new balance.
    pub(crate) fn debit_with<F>(
        &self,
        user: UserId,
        amount: Amount,
        event: F,
    ) -> Result<Amount, ArenaError>
    where
        F: FnOnce(Amount) -> ArenaEvent,
    {
        if amount == 0 {
            return Err(ArenaError::InvalidAmount);
        }
        let wallet = self.wallet(user).ok_or(ArenaError::InsufficientFunds)?;
        let mut data = wallet.inner.lock();
        let balance = data.debited(amount)?;
        self.journal.append(&event(balance))?;
        data.balance = balance;
        debug!(%user, amount, balance, "wallet debited");
        Ok(balance)
    }

    /// Snapshot of every wallet, ordered by user.
    pub fn wallets(&self) -> Vec<WalletBalance> {
        let wallets: Vec<Arc<Wallet>> = self
            .wallets
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut balances: Vec<WalletBalance> = wallets
            .iter()
            .map(|wallet| {
                let data = wallet.inner.lock();
                WalletBalance {
                    user: data.user_id,
                    balance: data.balance,
                }
            })
            .collect();
        balances.sort_unstable_by_key(|wallet| wallet.user);
        balances
    }

    fn wallet(&self, user: UserId) -> Option<Arc<Wallet>> {
        self.wallets.get(&user).map(|entry| Arc::clone(entry.value()))
    }

    // The map shard is released before the wallet mutex is taken.
    fn wallet_or_open(&self, user: UserId) -> Arc<Wallet> {
        let entry = self
            .wallets
            .entry(user)
            .or_insert_with(|| Arc::new(Wallet::new(user)));
        Arc::clone(entry.value())
    }
}
