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

//! Append-only event journal.
//!
//! Every state change in the arena is described by an [`ArenaEvent`] and
//! appended to a [`Journal`] while the affected record is still locked. The
//! new state is published only after the append succeeds, so a failing
//! journal leaves the arena exactly as it was.

use crate::ArenaError;
use crate::base::{Amount, RegistrationId, SlotNumber, TournamentId, UserId, WithdrawalId};
use crossbeam::queue::SegQueue;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A committed state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ArenaEvent {
    TournamentCreated {
        tournament: TournamentId,
        capacity: u32,
    },
    TournamentStarted {
        tournament: TournamentId,
    },
    RoomDetailsPublished {
        tournament: TournamentId,
    },
    RegistrationSubmitted {
        registration: RegistrationId,
        tournament: TournamentId,
        user: UserId,
    },
    RegistrationApproved {
        registration: RegistrationId,
        tournament: TournamentId,
        user: UserId,
        slot: SlotNumber,
    },
    RegistrationRejected {
        registration: RegistrationId,
        tournament: TournamentId,
        user: UserId,
    },
    WinnerDeclared {
        tournament: TournamentId,
        user: UserId,
        prize: Amount,
        balance: Amount,
    },
    Credited {
        user: UserId,
        amount: Amount,
        balance: Amount,
    },
    Debited {
        user: UserId,
        amount: Amount,
        balance: Amount,
    },
    Refunded {
        user: UserId,
        amount: Amount,
        balance: Amount,
    },
    WithdrawalRequested {
        withdrawal: WithdrawalId,
        user: UserId,
        amount: Amount,
        balance: Amount,
    },
    WithdrawalPaid {
        withdrawal: WithdrawalId,
        user: UserId,
        amount: Amount,
    },
    WithdrawalRejected {
        withdrawal: WithdrawalId,
        user: UserId,
        amount: Amount,
        balance: Amount,
    },
}

/// Durable sink for arena events.
///
/// Implementations must either persist the event or return an error; a
/// returned error aborts the operation that produced the event.
pub trait Journal: Send + Sync {
    fn append(&self, event: &ArenaEvent) -> Result<(), ArenaError>;
}

/// In-memory journal keeping every event in commit order.
///
/// Events are indexed by sequence number for reads, and their sequence
/// numbers are queued in a [`SegQueue`] until a flusher drains them.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    events: DashMap<u64, Arc<ArenaEvent>>,
    unflushed: SegQueue<u64>,
    next_seq: AtomicU64,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events appended so far.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All events in commit order.
    pub fn events(&self) -> Vec<ArenaEvent> {
        let mut entries: Vec<(u64, Arc<ArenaEvent>)> = self
            .events
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        entries.sort_unstable_by_key(|(seq, _)| *seq);
        entries
            .into_iter()
            .map(|(_, event)| ArenaEvent::clone(&event))
            .collect()
    }

    /// Takes the events appended since the previous drain, oldest first.
    pub fn drain_unflushed(&self) -> Vec<ArenaEvent> {
        let mut drained = Vec::new();
        while let Some(seq) = self.unflushed.pop() {
            if let Some(event) = self.events.get(&seq) {
                drained.push(ArenaEvent::clone(event.value()));
            }
        }
        drained
    }
}

impl Journal for MemoryJournal {
    fn append(&self, event: &ArenaEvent) -> Result<(), ArenaError> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.events.insert(seq, Arc::new(event.clone()));
        self.unflushed.push(seq);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credited(amount: Amount) -> ArenaEvent {
        ArenaEvent::Credited {
            user: UserId(1),
            amount,
            balance: amount,
        }
    }

    #[test]
    fn events_come_back_in_commit_order() {
        let journal = MemoryJournal::new();
        for amount in 1..=5 {
            journal.append(&credited(amount)).unwrap();
        }
        let amounts: Vec<Amount> = journal
            .events()
            .into_iter()
            .map(|event| match event {
                ArenaEvent::Credited { amount, .. } => amount,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(amounts, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn drain_returns_each_event_once() {
        let journal = MemoryJournal::new();
        journal.append(&credited(10)).unwrap();
        journal.append(&credited(20)).unwrap();

        assert_eq!(journal.drain_unflushed(), vec![credited(10), credited(20)]);
        assert!(journal.drain_unflushed().is_empty());

        journal.append(&credited(30)).unwrap();
        assert_eq!(journal.drain_unflushed(), vec![credited(30)]);
        assert_eq!(journal.len(), 3);
    }

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_string(&ArenaEvent::TournamentStarted {
            tournament: TournamentId(3),
        })
        .unwrap();
        assert_eq!(json, r#"{"event":"tournament_started","tournament":3}"#);
    }
}
