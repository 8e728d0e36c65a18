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

//! Settlement engine: winner declaration and withdrawal processing.
//!
//! Withdrawal funds are reserved (debited) when the request is filed. A paid
//! request has no further ledger effect; a rejected one is refunded in full.
//!
//! ```text
//!  request (debit) ──► Pending ──paid────► Paid
//!                         │
//!                         └──rejected──► Rejected (refund)
//! ```

use crate::ArenaError;
use crate::base::{Amount, TournamentId, UserId, WithdrawalId, now_millis};
use crate::error::Entity;
use crate::journal::{ArenaEvent, Journal};
use crate::tournament::{Tournament, TournamentBoard, TournamentStatus};
use crate::wallet::Ledger;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalStatus {
    Pending,
    Paid,
    Rejected,
}

/// Operator verdict on a pending withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Payout {
    Paid,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: WithdrawalId,
    pub user_id: UserId,
    pub amount: Amount,
    /// Payment address the operator pays out to.
    pub destination: String,
    pub status: WithdrawalStatus,
    pub created_at: u64,
}

pub struct SettlementEngine {
    board: Arc<TournamentBoard>,
    ledger: Arc<Ledger>,
    withdrawals: DashMap<WithdrawalId, Arc<Mutex<WithdrawalRequest>>>,
    next_id: AtomicU64,
    journal: Arc<dyn Journal>,
}

impl SettlementEngine {
    pub fn new(
        board: Arc<TournamentBoard>,
        ledger: Arc<Ledger>,
        journal: Arc<dyn Journal>,
    ) -> Self {
        Self {
            board,
            ledger,
            withdrawals: DashMap::new(),
            next_id: AtomicU64::new(1),
            journal,
        }
    }

    /// Completes a tournament and credits the prize to the winner.
    ///
    /// The completed state is published only after the credit succeeds, so a
    /// failed credit leaves the tournament as it was.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::NotFound`] - unknown tournament.
    /// - [`ArenaError::InvalidState`] - already completed, or the user holds no slot.
    /// - [`ArenaError::InvalidAmount`] - zero prize.
    pub fn declare_winner(
        &self,
        tournament_id: TournamentId,
        user: UserId,
        prize: Amount,
    ) -> Result<Tournament, ArenaError> {
        self.board.with_locked(tournament_id, |tournament| {
            if tournament.is_completed() {
                return Err(ArenaError::InvalidState("tournament already completed"));
            }
            if tournament.slot_of(user).is_none() {
                return Err(ArenaError::InvalidState(
                    "winner has no approved registration",
                ));
            }

            let mut settled = tournament.clone();
            settled.status = TournamentStatus::Completed;
            settled.winner = Some(user);

            let credited = self.ledger.credit_with(user, prize, |balance| {
                ArenaEvent::WinnerDeclared {
                    tournament: tournament_id,
                    user,
                    prize,
                    balance,
                }
            });
            if let Err(e) = credited {
                warn!(tournament = %tournament_id, %user, prize, error = %e, "prize credit failed, tournament left open");
                return Err(e);
            }

            *tournament = settled;
            info!(tournament = %tournament_id, %user, prize, "winner declared");
            Ok(tournament.clone())
        })
    }

    /// Reserves `amount` from the user's wallet and files a pending request.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::InvalidAmount`] - zero amount.
    /// - [`ArenaError::InvalidRequest`] - blank destination.
    /// - [`ArenaError::InsufficientFunds`] - balance below `amount`.
    pub fn request_withdrawal(
        &self,
        user: UserId,
        amount: Amount,
        destination: String,
    ) -> Result<WithdrawalId, ArenaError> {
        if destination.trim().is_empty() {
            return Err(ArenaError::InvalidRequest("destination is required".into()));
        }
        let id = WithdrawalId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.ledger.debit_with(user, amount, |balance| {
            ArenaEvent::WithdrawalRequested {
                withdrawal: id,
                user,
                amount,
                balance,
            }
        })?;
        let request = WithdrawalRequest {
            id,
            user_id: user,
            amount,
            destination,
            status: WithdrawalStatus::Pending,
            created_at: now_millis(),
        };
        self.withdrawals.insert(id, Arc::new(Mutex::new(request)));
        info!(withdrawal = %id, %user, amount, "withdrawal requested");
        Ok(id)
    }

    /// Marks a pending request paid, or rejects it and refunds the reservation.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::NotFound`] - unknown request.
    /// - [`ArenaError::AlreadyDecided`] - the request is not pending.
    pub fn process_withdrawal(
        &self,
        id: WithdrawalId,
        payout: Payout,
    ) -> Result<WithdrawalRequest, ArenaError> {
        let entry = self.entry(id)?;
        let mut request = entry.lock();
        if request.status != WithdrawalStatus::Pending {
            return Err(ArenaError::AlreadyDecided);
        }
        let user = request.user_id;
        let amount = request.amount;

        match payout {
            Payout::Paid => {
                self.journal.append(&ArenaEvent::WithdrawalPaid {
                    withdrawal: id,
                    user,
                    amount,
                })?;
                request.status = WithdrawalStatus::Paid;
                info!(withdrawal = %id, %user, amount, "withdrawal paid");
            }
            Payout::Rejected => {
                self.ledger.credit_with(user, amount, |balance| {
                    ArenaEvent::WithdrawalRejected {
                        withdrawal: id,
                        user,
                        amount,
                        balance,
                    }
                })?;
                request.status = WithdrawalStatus::Rejected;
                info!(withdrawal = %id, %user, amount, "withdrawal rejected and refunded");
            }
        }

        Ok(request.clone())
    }

    pub fn withdrawal(&self, id: WithdrawalId) -> Result<WithdrawalRequest, ArenaError> {
        Ok(self.entry(id)?.lock().clone())
    }

    /// A user's withdrawal history, newest first.
    pub fn withdrawals_for_user(&self, user: UserId) -> Vec<WithdrawalRequest> {
        let mut requests = self.collect(|request| request.user_id == user);
        requests.reverse();
        requests
    }

    /// Requests awaiting payout, oldest first.
    pub fn pending_withdrawals(&self) -> Vec<WithdrawalRequest> {
        self.collect(|request| request.status == WithdrawalStatus::Pending)
    }

    fn collect<P>(&self, predicate: P) -> Vec<WithdrawalRequest>
    where
        P: Fn(&WithdrawalRequest) -> bool,
    {
        let entries: Vec<Arc<Mutex<WithdrawalRequest>>> = self
            .withdrawals
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut requests: Vec<WithdrawalRequest> = entries
            .iter()
            .map(|entry| entry.lock().clone())
            .filter(|request| predicate(request))
            .collect();
        requests.sort_unstable_by_key(|request| request.id);
        requests
    }

    fn entry(&self, id: WithdrawalId) -> Result<Arc<Mutex<WithdrawalRequest>>, ArenaError> {
        self.withdrawals
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(ArenaError::NotFound(Entity::Withdrawal))
    }
}
