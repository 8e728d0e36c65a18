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

//! Arena-wide settings.

use crate::base::Amount;
use serde::{Deserialize, Serialize};

/// Operator settings that gate player actions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Reject player-originated operations while set.
    pub maintenance_mode: bool,
    /// Smallest withdrawal a player may request.
    pub min_withdrawal: Amount,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            maintenance_mode: false,
            min_withdrawal: 1,
        }
    }
}
