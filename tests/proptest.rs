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

//! Property-based tests for the arena.
//!
//! These tests verify invariants that should hold for any sequence of
//! registration decisions and wallet operations.

use arena_ledger::{
    Arena, ArenaError, Decision, Evidence, NewTournament, Payout, RegistrationStatus, SlotNumber,
    UserId,
};
use proptest::prelude::*;

// =============================================================================
// Arbitrary Strategies
// =============================================================================

/// Generate a positive amount in minor units.
fn arb_amount() -> impl Strategy<Value = u64> {
    1u64..=100_000
}

fn arb_decision() -> impl Strategy<Value = Decision> {
    prop_oneof![Just(Decision::Approved), Just(Decision::Rejected)]
}

#[derive(Debug, Clone)]
enum WalletOp {
    Credit(u64),
    Request(u64),
    Process(usize, Payout),
}

fn arb_wallet_op() -> impl Strategy<Value = WalletOp> {
    prop_oneof![
        arb_amount().prop_map(WalletOp::Credit),
        arb_amount().prop_map(WalletOp::Request),
        (
            0usize..8,
            prop_oneof![Just(Payout::Paid), Just(Payout::Rejected)]
        )
            .prop_map(|(index, payout)| WalletOp::Process(index, payout)),
    ]
}

fn evidence(user: u32) -> Evidence {
    Evidence {
        game_id: format!("p{user}"),
        game_uid: format!("{user}"),
        payment_reference: format!("ref-{user}"),
    }
}

// =============================================================================
// Slot Invariant Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// filled_slots equals the number of approved registrations, never exceeds
    /// capacity, and the granted slots are exactly 1..=filled.
    #[test]
    fn slots_match_approvals(
        capacity in 1u32..8,
        decisions in prop::collection::vec(arb_decision(), 1..16),
    ) {
        let arena = Arena::new();
        let tournament = arena
            .create_tournament(NewTournament {
                title: "Prop Cup".into(),
                game: "Other".into(),
                entry_fee: 0,
                prize_pool: 0,
                capacity,
            })
            .unwrap()
            .id;

        for (index, decision) in decisions.iter().enumerate() {
            let user = index as u32 + 1;
            let Ok(id) = arena.submit_registration(tournament, UserId(user), evidence(user)) else {
                continue;
            };
            match arena.decide_registration(id, *decision) {
                Ok(_) | Err(ArenaError::CapacityExceeded) => {}
                Err(e) => prop_assert!(false, "unexpected error {e}"),
            }
        }

        let state = arena.tournament(tournament).unwrap();
        let mut slots: Vec<SlotNumber> = arena
            .registrations_for_tournament(tournament)
            .iter()
            .filter(|registration| registration.status == RegistrationStatus::Approved)
            .map(|registration| registration.slot_number.unwrap())
            .collect();
        slots.sort();

        prop_assert!(state.filled_slots() <= state.capacity());
        prop_assert_eq!(slots.len() as u32, state.filled_slots());
        let expected: Vec<SlotNumber> = (1..=state.filled_slots()).map(SlotNumber).collect();
        prop_assert_eq!(slots, expected);
    }
}

// =============================================================================
// Ledger Invariant Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The balance equals credits minus outstanding and paid reservations,
    /// and is never negative.
    #[test]
    fn balance_is_conserved(ops in prop::collection::vec(arb_wallet_op(), 1..40)) {
        let arena = Arena::new();
        let user = UserId(1);
        let mut requests = Vec::new();
        let mut credited = 0u64;

        for op in ops {
            match op {
                WalletOp::Credit(amount) => {
                    arena.credit(user, amount).unwrap();
                    credited += amount;
                }
                WalletOp::Request(amount) => {
                    let before = arena.wallet_balance(user);
                    match arena.request_withdrawal(user, amount, "prop@upi".into()) {
                        Ok(id) => requests.push(id),
                        Err(ArenaError::InsufficientFunds) => {
                            prop_assert!(before < amount);
                            prop_assert_eq!(arena.wallet_balance(user), before);
                        }
                        Err(e) => prop_assert!(false, "unexpected error {e}"),
                    }
                }
                WalletOp::Process(index, payout) => {
                    if let Some(id) = requests.get(index) {
                        let _ = arena.process_withdrawal(*id, payout);
                    }
                }
            }
        }

        let reserved: u64 = arena
            .withdrawals_for_user(user)
            .iter()
            .filter(|request| request.status != arena_ledger::WithdrawalStatus::Rejected)
            .map(|request| request.amount)
            .sum();
        prop_assert_eq!(arena.wallet_balance(user), credited - reserved);
    }

    /// Requesting then rejecting a withdrawal is a round trip.
    #[test]
    fn reject_after_request_restores_balance(
        start in arb_amount(),
        fraction in 1u64..=100,
    ) {
        let arena = Arena::new();
        let user = UserId(7);
        arena.credit(user, start).unwrap();
        let amount = (start * fraction / 100).max(1);

        let id = arena.request_withdrawal(user, amount, "prop@upi".into()).unwrap();
        prop_assert_eq!(arena.wallet_balance(user), start - amount);

        arena.process_withdrawal(id, Payout::Rejected).unwrap();
        prop_assert_eq!(arena.wallet_balance(user), start);

        prop_assert_eq!(
            arena.process_withdrawal(id, Payout::Rejected),
            Err(ArenaError::AlreadyDecided)
        );
        prop_assert_eq!(arena.wallet_balance(user), start);
    }
}
