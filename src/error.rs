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

//! Error types for arena operations.

use std::fmt;
use thiserror::Error;

/// Kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Tournament,
    Registration,
    Withdrawal,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Tournament => "tournament",
            Entity::Registration => "registration",
            Entity::Withdrawal => "withdrawal request",
        };
        f.write_str(name)
    }
}

/// Arena processing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// Referenced record does not exist
    #[error("{0} not found")]
    NotFound(Entity),

    /// Registration or withdrawal already reached a terminal status
    #[error("already decided")]
    AlreadyDecided,

    /// Operation not allowed in the current tournament state
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// User already holds a pending or approved registration for the tournament
    #[error("duplicate registration")]
    DuplicateRegistration,

    /// Every slot of the tournament is taken
    #[error("tournament capacity exceeded")]
    CapacityExceeded,

    /// Debit would take the wallet below zero
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Amount is zero or below the configured minimum
    #[error("invalid amount")]
    InvalidAmount,

    /// Request failed gateway validation
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Player actions are disabled while the arena is under maintenance
    #[error("arena is under maintenance")]
    Maintenance,

    /// Journal append failed; no state was changed
    #[error("storage failure: {0}")]
    Storage(String),
}

impl ArenaError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ArenaError::NotFound(_) => "NOT_FOUND",
            ArenaError::AlreadyDecided => "ALREADY_DECIDED",
            ArenaError::InvalidState(_) => "INVALID_STATE",
            ArenaError::DuplicateRegistration => "DUPLICATE_REGISTRATION",
            ArenaError::CapacityExceeded => "CAPACITY_EXCEEDED",
            ArenaError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ArenaError::InvalidAmount => "INVALID_AMOUNT",
            ArenaError::InvalidRequest(_) => "INVALID_REQUEST",
            ArenaError::Maintenance => "MAINTENANCE",
            ArenaError::Storage(_) => "STORAGE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ArenaError, Entity};

    #[test]
    fn error_display_messages() {
        assert_eq!(
            ArenaError::NotFound(Entity::Tournament).to_string(),
            "tournament not found"
        );
        assert_eq!(
            ArenaError::NotFound(Entity::Withdrawal).to_string(),
            "withdrawal request not found"
        );
        assert_eq!(ArenaError::AlreadyDecided.to_string(), "already decided");
        assert_eq!(
            ArenaError::InvalidState("tournament completed").to_string(),
            "invalid state: tournament completed"
        );
        assert_eq!(
            ArenaError::CapacityExceeded.to_string(),
            "tournament capacity exceeded"
        );
        assert_eq!(ArenaError::InsufficientFunds.to_string(), "insufficient funds");
        assert_eq!(
            ArenaError::Storage("disk full".into()).to_string(),
            "storage failure: disk full"
        );
    }

    #[test]
    fn codes_are_distinct() {
        let errors = [
            ArenaError::NotFound(Entity::Registration),
            ArenaError::AlreadyDecided,
            ArenaError::InvalidState("x"),
            ArenaError::DuplicateRegistration,
            ArenaError::CapacityExceeded,
            ArenaError::InsufficientFunds,
            ArenaError::InvalidAmount,
            ArenaError::InvalidRequest("x".into()),
            ArenaError::Maintenance,
            ArenaError::Storage("x".into()),
        ];
        let mut codes: Vec<_> = errors.iter().map(ArenaError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
