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

//! Core identifier types for tournaments, registrations, users and withdrawals.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Money in minor currency units (e.g. paise, cents).
pub type Amount = u64;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Unique identifier for a tournament, issued by the arena on creation.
    TournamentId(u32)
);

id_type!(
    /// Unique identifier for a registration claim.
    RegistrationId(u64)
);

id_type!(
    /// Unique identifier for a player. Wallets are keyed by it.
    UserId(u32)
);

id_type!(
    /// Unique identifier for a withdrawal request.
    WithdrawalId(u64)
);

id_type!(
    /// Seat number inside one tournament. Starts at 1 and is never reused.
    SlotNumber(u32)
);

/// Milliseconds since the Unix epoch, used to stamp new records.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_as_bare_numbers() {
        assert_eq!(TournamentId(7).to_string(), "7");
        assert_eq!(SlotNumber(12).to_string(), "12");
        assert_eq!(WithdrawalId(900).to_string(), "900");
    }

    #[test]
    fn ids_serialize_transparently() {
        assert_eq!(serde_json::to_string(&UserId(42)).unwrap(), "42");
        let id: RegistrationId = serde_json::from_str("5").unwrap();
        assert_eq!(id, RegistrationId(5));
    }
}
