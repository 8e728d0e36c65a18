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

//! Registration state machine.
//!
//! ```text
//!  submit ──► Pending ──approve──► Approved (slot stamped)
//!                │
//!                └──reject───► Rejected
//! ```
//!
//! Submission only soft-checks capacity. The hard check happens on approval,
//! inside the tournament's lock and together with slot issuance, because
//! many pending claims may compete for the last few slots.

use crate::ArenaError;
use crate::base::{RegistrationId, SlotNumber, TournamentId, UserId, now_millis};
use crate::error::Entity;
use crate::journal::{ArenaEvent, Journal};
use crate::tournament::TournamentBoard;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// What a player submits to claim a seat: their in-game identity and the
/// reference of the out-of-band entry-fee payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub game_id: String,
    pub game_uid: String,
    pub payment_reference: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    /// Pending and approved registrations block a second claim.
    pub fn is_active(self) -> bool {
        self != RegistrationStatus::Rejected
    }
}

/// Operator verdict on a pending registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: RegistrationId,
    pub tournament_id: TournamentId,
    pub user_id: UserId,
    pub evidence: Evidence,
    pub status: RegistrationStatus,
    /// Set exactly when the registration is approved.
    pub slot_number: Option<SlotNumber>,
    pub created_at: u64,
}

/// Owner of every registration and of the active-claim index.
pub struct RegistrationDesk {
    registrations: DashMap<RegistrationId, Arc<Mutex<Registration>>>,
    /// Active (pending or approved) registration per user and tournament.
    active: DashMap<(UserId, TournamentId), RegistrationId>,
    next_id: AtomicU64,
    board: Arc<TournamentBoard>,
    journal: Arc<dyn Journal>,
}

impl RegistrationDesk {
    pub fn new(board: Arc<TournamentBoard>, journal: Arc<dyn Journal>) -> Self {
        Self {
            registrations: DashMap::new(),
            active: DashMap::new(),
            next_id: AtomicU64::new(1),
            board,
            journal,
        }
    }

    /// Files a pending claim for a seat.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::NotFound`] - unknown tournament.
    /// - [`ArenaError::InvalidState`] - the tournament is completed.
    /// - [`ArenaError::DuplicateRegistration`] - the user already has an active claim.
    /// - [`ArenaError::CapacityExceeded`] - every slot is already granted.
    pub fn submit(
        &self,
        tournament_id: TournamentId,
        user: UserId,
        evidence: Evidence,
    ) -> Result<RegistrationId, ArenaError> {
        let tournament = self.board.get(tournament_id)?;
        if tournament.is_completed() {
            return Err(ArenaError::InvalidState("tournament completed"));
        }

        // Entry API keeps the duplicate check and the index insert atomic.
        match self.active.entry((user, tournament_id)) {
            Entry::Occupied(_) => Err(ArenaError::DuplicateRegistration),
            Entry::Vacant(vacant) => {
                if !tournament.slots().has_room() {
                    return Err(ArenaError::CapacityExceeded);
                }
                let id = RegistrationId(self.next_id.fetch_add(1, Ordering::SeqCst));
                self.journal.append(&ArenaEvent::RegistrationSubmitted {
                    registration: id,
                    tournament: tournament_id,
                    user,
                })?;
                let registration = Registration {
                    id,
                    tournament_id,
                    user_id: user,
                    evidence,
                    status: RegistrationStatus::Pending,
                    slot_number: None,
                    created_at: now_millis(),
                };
                self.registrations
                    .insert(id, Arc::new(Mutex::new(registration)));
                vacant.insert(id);
                debug!(registration = %id, tournament = %tournament_id, %user, "registration submitted");
                Ok(id)
            }
        }
    }

    /// Approves or rejects a pending registration.
    ///
    /// Approval re-checks capacity and takes the next slot number under the
    /// tournament's lock.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::NotFound`] - unknown registration.
    /// - [`ArenaError::AlreadyDecided`] - the registration is not pending.
    /// - [`ArenaError::CapacityExceeded`] - approval with no slot left; the
    ///   registration stays pending.
    /// - [`ArenaError::InvalidState`] - approval after the tournament completed.
    pub fn decide(
        &self,
        id: RegistrationId,
        decision: Decision,
    ) -> Result<Registration, ArenaError> {
        let entry = self.entry(id)?;
        let mut registration = entry.lock();
        if registration.status != RegistrationStatus::Pending {
            return Err(ArenaError::AlreadyDecided);
        }
        let tournament_id = registration.tournament_id;
        let user = registration.user_id;

        match decision {
            Decision::Rejected => {
                self.journal.append(&ArenaEvent::RegistrationRejected {
                    registration: id,
                    tournament: tournament_id,
                    user,
                })?;
                registration.status = RegistrationStatus::Rejected;
                self.active
                    .remove_if(&(user, tournament_id), |_, active| *active == id);
                info!(registration = %id, tournament = %tournament_id, %user, "registration rejected");
            }
            Decision::Approved => {
                let slot = self.board.with_locked(tournament_id, |tournament| {
                    if tournament.is_completed() {
                        return Err(ArenaError::InvalidState("tournament completed"));
                    }
                    let slot = tournament.slots().next_slot(user)?;
                    self.journal.append(&ArenaEvent::RegistrationApproved {
                        registration: id,
                        tournament: tournament_id,
                        user,
                        slot,
                    })?;
                    tournament.slots_mut().grant(user)?;
                    Ok(slot)
                })?;
                registration.status = RegistrationStatus::Approved;
                registration.slot_number = Some(slot);
                info!(registration = %id, tournament = %tournament_id, %user, %slot, "registration approved");
            }
        }

        Ok(registration.clone())
    }

    pub fn get(&self, id: RegistrationId) -> Result<Registration, ArenaError> {
        Ok(self.entry(id)?.lock().clone())
    }

    /// Registrations for one tournament in submission order.
    pub fn for_tournament(&self, tournament_id: TournamentId) -> Vec<Registration> {
        self.collect(|registration| registration.tournament_id == tournament_id)
    }

    /// Registrations filed by one user in submission order.
    pub fn for_user(&self, user: UserId) -> Vec<Registration> {
        self.collect(|registration| registration.user_id == user)
    }

    /// The operator's review queue, oldest first.
    pub fn pending(&self) -> Vec<Registration> {
        self.collect(|registration| registration.status == RegistrationStatus::Pending)
    }

    fn collect<P>(&self, predicate: P) -> Vec<Registration>
    where
        P: Fn(&Registration) -> bool,
    {
        let entries: Vec<Arc<Mutex<Registration>>> = self
            .registrations
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut registrations: Vec<Registration> = entries
            .iter()
            .map(|entry| entry.lock().clone())
            .filter(|registration| predicate(registration))
            .collect();
        registrations.sort_unstable_by_key(|registration| registration.id);
        registrations
    }

    fn entry(&self, id: RegistrationId) -> Result<Arc<Mutex<Registration>>, ArenaError> {
        self.registrations
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(ArenaError::NotFound(Entity::Registration))
    }
}
