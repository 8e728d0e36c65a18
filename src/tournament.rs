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

//! Tournament records.
//!
//! Tournaments move `Upcoming` → `Ongoing` → `Completed`. Completion only
//! happens through winner declaration in the settlement engine. Capacity is
//! fixed at creation.

use crate::ArenaError;
use crate::base::{Amount, SlotNumber, TournamentId, UserId};
use crate::error::Entity;
use crate::journal::{ArenaEvent, Journal};
use crate::slots::SlotAllocator;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TournamentStatus {
    Upcoming,
    Ongoing,
    Completed,
}

/// Operator input for creating a tournament.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTournament {
    pub title: String,
    pub game: String,
    pub entry_fee: Amount,
    pub prize_pool: Amount,
    pub capacity: u32,
}

/// Snapshot of a tournament.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tournament {
    pub id: TournamentId,
    pub title: String,
    pub game: String,
    pub entry_fee: Amount,
    pub prize_pool: Amount,
    pub status: TournamentStatus,
    pub winner: Option<UserId>,
    pub room_details: Option<String>,
    slots: SlotAllocator,
}

impl Tournament {
    fn new(id: TournamentId, draft: NewTournament) -> Self {
        Self {
            id,
            title: draft.title,
            game: draft.game,
            entry_fee: draft.entry_fee,
            prize_pool: draft.prize_pool,
            status: TournamentStatus::Upcoming,
            winner: None,
            room_details: None,
            slots: SlotAllocator::new(draft.capacity),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.slots.capacity()
    }

    pub fn filled_slots(&self) -> u32 {
        self.slots.filled()
    }

    pub fn slot_of(&self, user: UserId) -> Option<SlotNumber> {
        self.slots.slot_of(user)
    }

    pub fn slots(&self) -> &SlotAllocator {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut SlotAllocator {
        &mut self.slots
    }

    pub fn is_completed(&self) -> bool {
        self.status == TournamentStatus::Completed
    }
}

impl Serialize for Tournament {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Tournament", 10)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("title", &self.title)?;
        state.serialize_field("game", &self.game)?;
        state.serialize_field("entry_fee", &self.entry_fee)?;
        state.serialize_field("prize_pool", &self.prize_pool)?;
        state.serialize_field("capacity", &self.capacity())?;
        state.serialize_field("filled_slots", &self.filled_slots())?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("winner", &self.winner)?;
        state.serialize_field("room_details", &self.room_details)?;
        state.end()
    }
}

/// All tournaments, each behind its own lock.
pub struct TournamentBoard {
    tournaments: DashMap<TournamentId, Arc<Mutex<Tournament>>>,
    next_id: AtomicU32,
    journal: Arc<dyn Journal>,
}

impl TournamentBoard {
    pub fn new(journal: Arc<dyn Journal>) -> Self {
        Self {
            tournaments: DashMap::new(),
            next_id: AtomicU32::new(1),
            journal,
        }
    }

    /// Publishes a new `Upcoming` tournament with no filled slots.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::InvalidRequest`] - zero capacity or blank title.
    pub fn create(&self, draft: NewTournament) -> Result<Tournament, ArenaError> {
        if draft.capacity == 0 {
            return Err(ArenaError::InvalidRequest(
                "capacity must be positive".into(),
            ));
        }
        if draft.title.trim().is_empty() {
            return Err(ArenaError::InvalidRequest("title is required".into()));
        }
        let id = TournamentId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let tournament = Tournament::new(id, draft);
        self.journal.append(&ArenaEvent::TournamentCreated {
            tournament: id,
            capacity: tournament.capacity(),
        })?;
        self.tournaments
            .insert(id, Arc::new(Mutex::new(tournament.clone())));
        info!(tournament = %id, capacity = tournament.capacity(), "tournament created");
        Ok(tournament)
    }

    pub fn get(&self, id: TournamentId) -> Result<Tournament, ArenaError> {
        Ok(self.entry(id)?.lock().clone())
    }

    /// Every tournament, ordered by id.
    pub fn all(&self) -> Vec<Tournament> {
        let entries: Vec<Arc<Mutex<Tournament>>> = self
            .tournaments
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut tournaments: Vec<Tournament> =
            entries.iter().map(|entry| entry.lock().clone()).collect();
        tournaments.sort_unstable_by_key(|tournament| tournament.id);
        tournaments
    }

    /// Moves an `Upcoming` tournament to `Ongoing`.
    pub fn start(&self, id: TournamentId) -> Result<Tournament, ArenaError> {
        self.with_locked(id, |tournament| {
            if tournament.status != TournamentStatus::Upcoming {
                return Err(ArenaError::InvalidState("tournament already started"));
            }
            self.journal
                .append(&ArenaEvent::TournamentStarted { tournament: id })?;
            tournament.status = TournamentStatus::Ongoing;
            info!(tournament = %id, "tournament started");
            Ok(tournament.clone())
        })
    }

    /// Sets the room text revealed to slot holders.
    pub fn set_room_details(
        &self,
        id: TournamentId,
        details: String,
    ) -> Result<Tournament, ArenaError> {
        self.with_locked(id, |tournament| {
            if tournament.is_completed() {
                return Err(ArenaError::InvalidState("tournament completed"));
            }
            self.journal
                .append(&ArenaEvent::RoomDetailsPublished { tournament: id })?;
            tournament.room_details = Some(details);
            Ok(tournament.clone())
        })
    }

    /// Room details, visible only to a user holding a slot.
    pub fn room_details_for(
        &self,
        id: TournamentId,
        user: UserId,
    ) -> Result<Option<String>, ArenaError> {
        let entry = self.entry(id)?;
        let tournament = entry.lock();
        Ok(tournament
            .slot_of(user)
            .and(tournament.room_details.clone()))
    }

    /// Runs `f` while holding the tournament's lock.
    pub(crate) fn with_locked<R, F>(&self, id: TournamentId, f: F) -> Result<R, ArenaError>
    where
        F: FnOnce(&mut Tournament) -> Result<R, ArenaError>,
    {
        let entry = self.entry(id)?;
        let mut tournament = entry.lock();
        f(&mut tournament)
    }

    fn entry(&self, id: TournamentId) -> Result<Arc<Mutex<Tournament>>, ArenaError> {
        self.tournaments
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(ArenaError::NotFound(Entity::Tournament))
    }
}
