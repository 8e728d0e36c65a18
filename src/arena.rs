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

//! The arena facade.
//!
//! [`Arena`] wires the tournament board, registration desk, ledger and
//! settlement engine to one journal and exposes the operations the admin
//! gateway and player front ends call.
//!
//! # Locking
//!
//! Every tournament, registration, withdrawal request and wallet has its own
//! mutex; there is no global lock. Nested locks are only ever taken in the
//! order registration → tournament → wallet and withdrawal → wallet.

use crate::ArenaError;
use crate::base::{Amount, RegistrationId, TournamentId, UserId, WithdrawalId};
use crate::config::ArenaConfig;
use crate::journal::{Journal, MemoryJournal};
use crate::registration::{Decision, Evidence, Registration, RegistrationDesk};
use crate::settlement::{Payout, SettlementEngine, WithdrawalRequest};
use crate::tournament::{NewTournament, Tournament, TournamentBoard};
use crate::wallet::{Ledger, WalletBalance};
use parking_lot::RwLock;
use std::sync::Arc;

pub struct Arena {
    config: RwLock<ArenaConfig>,
    board: Arc<TournamentBoard>,
    ledger: Arc<Ledger>,
    desk: RegistrationDesk,
    settlement: SettlementEngine,
}

impl Arena {
    /// Creates an empty arena with default settings and an in-memory journal.
    pub fn new() -> Self {
        Self::with_config(ArenaConfig::default())
    }

    pub fn with_config(config: ArenaConfig) -> Self {
        Self::with_journal(config, Arc::new(MemoryJournal::new()))
    }

    /// Creates an empty arena that records every change to `journal`.
    pub fn with_journal(config: ArenaConfig, journal: Arc<dyn Journal>) -> Self {
        let board = Arc::new(TournamentBoard::new(Arc::clone(&journal)));
        let ledger = Arc::new(Ledger::new(Arc::clone(&journal)));
        let desk = RegistrationDesk::new(Arc::clone(&board), Arc::clone(&journal));
        let settlement =
            SettlementEngine::new(Arc::clone(&board), Arc::clone(&ledger), journal);
        Arena {
            config: RwLock::new(config),
            board,
            ledger,
            desk,
            settlement,
        }
    }

    pub fn config(&self) -> ArenaConfig {
        self.config.read().clone()
    }

    pub fn set_config(&self, config: ArenaConfig) {
        *self.config.write() = config;
    }

    // === Tournaments ===

    pub fn create_tournament(&self, draft: NewTournament) -> Result<Tournament, ArenaError> {
        self.board.create(draft)
    }

    pub fn start_tournament(&self, id: TournamentId) -> Result<Tournament, ArenaError> {
        self.board.start(id)
    }

    pub fn set_room_details(
        &self,
        id: TournamentId,
        details: String,
    ) -> Result<Tournament, ArenaError> {
        self.board.set_room_details(id, details)
    }

    /// Room details if `user` holds a slot in the tournament.
    pub fn room_details_for(
        &self,
        id: TournamentId,
        user: UserId,
    ) -> Result<Option<String>, ArenaError> {
        self.board.room_details_for(id, user)
    }

    pub fn tournament(&self, id: TournamentId) -> Result<Tournament, ArenaError> {
        self.board.get(id)
    }

    pub fn tournaments(&self) -> Vec<Tournament> {
        self.board.all()
    }

    // === Registrations ===

    /// Files a pending registration on behalf of a player.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::Maintenance`] - player actions are disabled.
    /// - Everything [`RegistrationDesk::submit`] returns.
    pub fn submit_registration(
        &self,
        tournament_id: TournamentId,
        user: UserId,
        evidence: Evidence,
    ) -> Result<RegistrationId, ArenaError> {
        self.ensure_open()?;
        self.desk.submit(tournament_id, user, evidence)
    }

    pub fn decide_registration(
        &self,
        id: RegistrationId,
        decision: Decision,
    ) -> Result<Registration, ArenaError> {
        self.desk.decide(id, decision)
    }

    pub fn registration(&self, id: RegistrationId) -> Result<Registration, ArenaError> {
        self.desk.get(id)
    }

    pub fn registrations_for_tournament(&self, id: TournamentId) -> Vec<Registration> {
        self.desk.for_tournament(id)
    }

    pub fn registrations_for_user(&self, user: UserId) -> Vec<Registration> {
        self.desk.for_user(user)
    }

    pub fn pending_registrations(&self) -> Vec<Registration> {
        self.desk.pending()
    }

    // === Settlement ===

    pub fn declare_winner(
        &self,
        tournament_id: TournamentId,
        user: UserId,
        prize: Amount,
    ) -> Result<Tournament, ArenaError> {
        self.settlement.declare_winner(tournament_id, user, prize)
    }

    /// Reserves funds for a payout on behalf of a player.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::Maintenance`] - player actions are disabled.
    /// - [`ArenaError::InvalidAmount`] - below the configured minimum.
    /// - Everything [`SettlementEngine::request_withdrawal`] returns.
    pub fn request_withdrawal(
        &self,
        user: UserId,
        amount: Amount,
        destination: String,
    ) -> Result<WithdrawalId, ArenaError> {
        self.ensure_open()?;
        if amount < self.config.read().min_withdrawal {
            return Err(ArenaError::InvalidAmount);
        }
        self.settlement.request_withdrawal(user, amount, destination)
    }

    pub fn process_withdrawal(
        &self,
        id: WithdrawalId,
        payout: Payout,
    ) -> Result<WithdrawalRequest, ArenaError> {
        self.settlement.process_withdrawal(id, payout)
    }

    pub fn withdrawal(&self, id: WithdrawalId) -> Result<WithdrawalRequest, ArenaError> {
        self.settlement.withdrawal(id)
    }

    pub fn withdrawals_for_user(&self, user: UserId) -> Vec<WithdrawalRequest> {
        self.settlement.withdrawals_for_user(user)
    }

    pub fn pending_withdrawals(&self) -> Vec<WithdrawalRequest> {
        self.settlement.pending_withdrawals()
    }

    // === Wallets ===

    pub fn wallet_balance(&self, user: UserId) -> Amount {
        self.ledger.balance(user)
    }

    /// Operator balance adjustment.
    pub fn credit(&self, user: UserId, amount: Amount) -> Result<Amount, ArenaError> {
        self.ledger.credit(user, amount)
    }

    pub fn wallets(&self) -> Vec<WalletBalance> {
        self.ledger.wallets()
    }

    fn ensure_open(&self) -> Result<(), ArenaError> {
        if self.config.read().maintenance_mode {
            return Err(ArenaError::Maintenance);
        }
        Ok(())
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}
