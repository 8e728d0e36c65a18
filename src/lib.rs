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

//! # Arena Ledger
//!
//! Core of a paid-entry tournament marketplace: the registration-approval,
//! slot-allocation and wallet-settlement state machines. Players file
//! registration claims backed by an out-of-band payment reference; an
//! operator approves or rejects them, approvals receive sequential slot
//! numbers, winners are paid into an internal wallet, and withdrawals are
//! reserved against that wallet until they are paid or refunded.
//!
//! ## Core Components
//!
//! - [`Arena`]: Facade exposing every operation
//! - [`Ledger`]: Wallet balances with a non-negative invariant
//! - [`SlotAllocator`]: Per-tournament capacity and slot issuance
//! - [`RegistrationDesk`]: Registration lifecycle (pending → approved/rejected)
//! - [`SettlementEngine`]: Winner declaration and withdrawal processing
//! - [`AdminGateway`]: Validated command interface for front ends
//! - [`Journal`]: Persistence seam every change is appended to
//!
//! ## Example
//!
//! ```
//! use arena_ledger::{Arena, Decision, Evidence, NewTournament, Payout, SlotNumber, UserId};
//!
//! let arena = Arena::new();
//! let tournament = arena
//!     .create_tournament(NewTournament {
//!         title: "Friday Scrims".into(),
//!         game: "BGMI".into(),
//!         entry_fee: 50,
//!         prize_pool: 1_000,
//!         capacity: 2,
//!     })
//!     .unwrap();
//!
//! let evidence = Evidence {
//!     game_id: "Viper".into(),
//!     game_uid: "5550001".into(),
//!     payment_reference: "UTR123".into(),
//! };
//! let registration = arena.submit_registration(tournament.id, UserId(7), evidence).unwrap();
//! let approved = arena.decide_registration(registration, Decision::Approved).unwrap();
//! assert_eq!(approved.slot_number, Some(SlotNumber(1)));
//!
//! arena.declare_winner(tournament.id, UserId(7), 1_000).unwrap();
//! let withdrawal = arena.request_withdrawal(UserId(7), 400, "viper@upi".into()).unwrap();
//! assert_eq!(arena.wallet_balance(UserId(7)), 600);
//!
//! arena.process_withdrawal(withdrawal, Payout::Rejected).unwrap();
//! assert_eq!(arena.wallet_balance(UserId(7)), 1_000);
//! ```
//!
//! ## Thread Safety
//!
//! Each tournament, registration, withdrawal request and wallet is guarded by
//! its own lock, so unrelated tournaments and users are processed in parallel.

mod arena;
mod base;
pub mod config;
pub mod error;
pub mod gateway;
pub mod journal;
mod registration;
mod settlement;
mod slots;
mod tournament;
pub mod wallet;

pub use arena::Arena;
pub use base::{Amount, RegistrationId, SlotNumber, TournamentId, UserId, WithdrawalId};
pub use config::ArenaConfig;
pub use error::{ArenaError, Entity};
pub use gateway::{AdminGateway, Command, Response};
pub use journal::{ArenaEvent, Journal, MemoryJournal};
pub use registration::{Decision, Evidence, Registration, RegistrationDesk, RegistrationStatus};
pub use settlement::{Payout, SettlementEngine, WithdrawalRequest, WithdrawalStatus};
pub use slots::SlotAllocator;
pub use tournament::{NewTournament, Tournament, TournamentBoard, TournamentStatus};
pub use wallet::{Ledger, WalletBalance};
