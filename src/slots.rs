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

//! Slot allocation for a single tournament.
//!
//! A [`SlotAllocator`] lives inside its tournament's lock. Approval asks it
//! for the next slot and grants that slot in the same critical section, so
//! the capacity check and the issued number can never disagree.

use crate::ArenaError;
use crate::base::{SlotNumber, UserId};

/// Capacity and issued slot numbers of one tournament.
///
/// Slot `n` belongs to `holders[n - 1]`; slots are issued contiguously from 1
/// and never reclaimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotAllocator {
    capacity: u32,
    holders: Vec<UserId>,
}

impl SlotAllocator {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            holders: Vec::new(),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of slots granted so far.
    pub fn filled(&self) -> u32 {
        // holders never exceeds capacity, which is a u32.
        self.holders.len() as u32
    }

    pub fn has_room(&self) -> bool {
        self.filled() < self.capacity
    }

    /// Slot held by `user`, if any.
    pub fn slot_of(&self, user: UserId) -> Option<SlotNumber> {
        self.holders
            .iter()
            .position(|holder| *holder == user)
            .map(|index| SlotNumber(index as u32 + 1))
    }

    /// Slot holders in slot order.
    pub fn holders(&self) -> impl Iterator<Item = (SlotNumber, UserId)> + '_ {
        self.holders
            .iter()
            .enumerate()
            .map(|(index, user)| (SlotNumber(index as u32 + 1), *user))
    }

    /// The slot that [`SlotAllocator::grant`] would issue to `user`.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::CapacityExceeded`] - every slot is taken.
    /// - [`ArenaError::DuplicateRegistration`] - `user` already holds a slot.
    pub fn next_slot(&self, user: UserId) -> Result<SlotNumber, ArenaError> {
        if self.slot_of(user).is_some() {
            return Err(ArenaError::DuplicateRegistration);
        }
        if !self.has_room() {
            return Err(ArenaError::CapacityExceeded);
        }
        Ok(SlotNumber(self.filled() + 1))
    }

    /// Issues the next slot to `user`.
    pub fn grant(&mut self, user: UserId) -> Result<SlotNumber, ArenaError> {
        let slot = self.next_slot(user)?;
        self.holders.push(user);
        debug_assert!(
            self.filled() <= self.capacity,
            "Invariant violated: {} slots filled of {}",
            self.filled(),
            self.capacity
        );
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_contiguous_from_one() {
        let mut slots = SlotAllocator::new(3);
        assert_eq!(slots.grant(UserId(10)), Ok(SlotNumber(1)));
        assert_eq!(slots.grant(UserId(20)), Ok(SlotNumber(2)));
        assert_eq!(slots.grant(UserId(30)), Ok(SlotNumber(3)));
        assert_eq!(slots.filled(), 3);
        assert!(!slots.has_room());
    }

    #[test]
    fn full_allocator_refuses() {
        let mut slots = SlotAllocator::new(1);
        slots.grant(UserId(1)).unwrap();
        assert_eq!(slots.next_slot(UserId(2)), Err(ArenaError::CapacityExceeded));
        assert_eq!(slots.grant(UserId(2)), Err(ArenaError::CapacityExceeded));
        assert_eq!(slots.filled(), 1);
    }

    #[test]
    fn a_user_holds_at_most_one_slot() {
        let mut slots = SlotAllocator::new(5);
        slots.grant(UserId(1)).unwrap();
        assert_eq!(slots.grant(UserId(1)), Err(ArenaError::DuplicateRegistration));
    }

    #[test]
    fn next_slot_does_not_reserve() {
        let slots = SlotAllocator::new(2);
        assert_eq!(slots.next_slot(UserId(1)), Ok(SlotNumber(1)));
        assert_eq!(slots.next_slot(UserId(2)), Ok(SlotNumber(1)));
        assert_eq!(slots.filled(), 0);
    }

    #[test]
    fn holders_follow_slot_order() {
        let mut slots = SlotAllocator::new(4);
        slots.grant(UserId(7)).unwrap();
        slots.grant(UserId(3)).unwrap();
        let holders: Vec<_> = slots.holders().collect();
        assert_eq!(
            holders,
            vec![(SlotNumber(1), UserId(7)), (SlotNumber(2), UserId(3))]
        );
        assert_eq!(slots.slot_of(UserId(3)), Some(SlotNumber(2)));
        assert_eq!(slots.slot_of(UserId(4)), None);
    }
}
