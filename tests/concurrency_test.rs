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

//! Concurrency tests using parking_lot's built-in deadlock detector.
//!
//! These tests hammer the arena from many threads and check that per-key
//! locking keeps slot issuance and wallet balances consistent without
//! deadlocking.

use arena_ledger::{
    Arena, ArenaError, Decision, Evidence, NewTournament, Payout, RegistrationId,
    RegistrationStatus, SlotNumber, TournamentId, UserId,
};
use parking_lot::deadlock;
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

// === Deadlock Detection Infrastructure ===

/// Starts a background thread that checks for deadlocks.
/// Returns a handle to stop the detector.
fn start_deadlock_detector() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    thread::spawn(move || {
        while running_clone.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(100));
            let deadlocks = deadlock::check_deadlock();
            if !deadlocks.is_empty() {
                eprintln!("\n=== DEADLOCK DETECTED ===");
                for (i, threads) in deadlocks.iter().enumerate() {
                    eprintln!("\nDeadlock #{}", i + 1);
                    for t in threads {
                        eprintln!("Thread ID: {:?}", t.thread_id());
                        eprintln!("Backtrace:\n{:#?}", t.backtrace());
                    }
                }
                panic!("Deadlock detected! See output above for details.");
            }
        }
    });

    running
}

/// Stops the deadlock detector.
fn stop_deadlock_detector(running: Arc<AtomicBool>) {
    running.store(false, Ordering::SeqCst);
    thread::sleep(Duration::from_millis(150));
}

fn make_tournament(arena: &Arena, capacity: u32) -> TournamentId {
    arena
        .create_tournament(NewTournament {
            title: "Stress Cup".into(),
            game: "COD Mobile".into(),
            entry_fee: 100,
            prize_pool: 10_000,
            capacity,
        })
        .unwrap()
        .id
}

fn evidence(user: u32) -> Evidence {
    Evidence {
        game_id: format!("stress{user}"),
        game_uid: user.to_string(),
        payment_reference: format!("UTR-{user}"),
    }
}

// === Tests ===

/// Many operators approve many pending claims for few slots at once.
#[test]
fn concurrent_approvals_never_overcommit() {
    let detector = start_deadlock_detector();
    let arena = Arc::new(Arena::new());

    const CAPACITY: u32 = 16;
    const CLAIMS: u32 = 200;

    let tournament = make_tournament(&arena, CAPACITY);
    let ids: Vec<RegistrationId> = (1..=CLAIMS)
        .map(|user| {
            arena
                .submit_registration(tournament, UserId(user), evidence(user))
                .unwrap()
        })
        .collect();

    let approved = AtomicUsize::new(0);
    let refused = AtomicUsize::new(0);
    ids.par_iter().for_each(|id| {
        match arena.decide_registration(*id, Decision::Approved) {
            Ok(_) => approved.fetch_add(1, Ordering::SeqCst),
            Err(ArenaError::CapacityExceeded) => refused.fetch_add(1, Ordering::SeqCst),
            Err(e) => panic!("unexpected error {e}"),
        };
    });

    stop_deadlock_detector(detector);

    assert_eq!(approved.load(Ordering::SeqCst), CAPACITY as usize);
    assert_eq!(refused.load(Ordering::SeqCst), (CLAIMS - CAPACITY) as usize);

    let state = arena.tournament(tournament).unwrap();
    assert_eq!(state.filled_slots(), CAPACITY);

    let mut slots: Vec<SlotNumber> = arena
        .registrations_for_tournament(tournament)
        .into_iter()
        .filter(|registration| registration.status == RegistrationStatus::Approved)
        .filter_map(|registration| registration.slot_number)
        .collect();
    slots.sort();
    let expected: Vec<SlotNumber> = (1..=CAPACITY).map(SlotNumber).collect();
    assert_eq!(slots, expected);
}

/// Many threads race to withdraw from one wallet.
#[test]
fn concurrent_withdrawals_never_overdraw() {
    let detector = start_deadlock_detector();
    let arena = Arc::new(Arena::new());
    let user = UserId(1);
    arena.credit(user, 1_000).unwrap();

    const NUM_THREADS: usize = 32;
    const REQUESTS_PER_THREAD: usize = 10;

    let mut handles = Vec::with_capacity(NUM_THREADS);
    for _ in 0..NUM_THREADS {
        let arena = arena.clone();
        handles.push(thread::spawn(move || {
            let mut granted = 0u64;
            for _ in 0..REQUESTS_PER_THREAD {
                match arena.request_withdrawal(user, 7, "stress@upi".into()) {
                    Ok(_) => granted += 7,
                    Err(ArenaError::InsufficientFunds) => {}
                    Err(e) => panic!("unexpected error {e}"),
                }
                let _ = arena.wallet_balance(user);
            }
            granted
        }));
    }

    let granted: u64 = handles
        .into_iter()
        .map(|handle| handle.join().expect("Thread panicked"))
        .sum();

    stop_deadlock_detector(detector);

    assert!(granted <= 1_000);
    assert_eq!(arena.wallet_balance(user), 1_000 - granted);
    // 320 requests of 7 exhaust everything a multiple of 7 can take.
    assert_eq!(arena.wallet_balance(user), 1_000 % 7);
}

/// Two operators process the same withdrawal; exactly one wins.
#[test]
fn concurrent_processing_is_idempotent() {
    let detector = start_deadlock_detector();
    let arena = Arc::new(Arena::new());

    const USERS: u32 = 50;
    let mut requests = Vec::new();
    for user in 1..=USERS {
        arena.credit(UserId(user), 200).unwrap();
        requests.push(
            arena
                .request_withdrawal(UserId(user), 150, "ops@upi".into())
                .unwrap(),
        );
    }

    let successes = AtomicUsize::new(0);
    let repeats = AtomicUsize::new(0);
    requests
        .par_iter()
        .flat_map(|id| vec![*id; 4])
        .for_each(|id| match arena.process_withdrawal(id, Payout::Rejected) {
            Ok(_) => {
                successes.fetch_add(1, Ordering::SeqCst);
            }
            Err(ArenaError::AlreadyDecided) => {
                repeats.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => panic!("unexpected error {e}"),
        });

    stop_deadlock_detector(detector);

    assert_eq!(successes.load(Ordering::SeqCst), USERS as usize);
    assert_eq!(repeats.load(Ordering::SeqCst), USERS as usize * 3);
    for user in 1..=USERS {
        // Refunded exactly once.
        assert_eq!(arena.wallet_balance(UserId(user)), 200);
    }
}

/// Approvals, winner declarations, withdrawals and reads across many
/// tournaments and users at the same time.
#[test]
fn no_deadlock_mixed_operations() {
    let detector = start_deadlock_detector();
    let arena = Arc::new(Arena::new());

    const TOURNAMENTS: u32 = 8;
    const PLAYERS: u32 = 12;

    let tournaments: Vec<TournamentId> = (0..TOURNAMENTS)
        .map(|_| make_tournament(&arena, PLAYERS / 2))
        .collect();

    let mut handles = Vec::new();
    for (index, tournament) in tournaments.iter().copied().enumerate() {
        let arena = arena.clone();
        handles.push(thread::spawn(move || {
            let mut winner = None;
            for player in 1..=PLAYERS {
                let Ok(id) = arena.submit_registration(tournament, UserId(player), evidence(player))
                else {
                    continue;
                };
                if let Ok(registration) = arena.decide_registration(id, Decision::Approved) {
                    winner.get_or_insert(registration.user_id);
                }
                let _ = arena.tournaments();
                let _ = arena.pending_registrations();
            }
            if let Some(user) = winner {
                arena
                    .declare_winner(tournament, user, 100 + index as u64)
                    .unwrap();
                let _ = arena.request_withdrawal(user, 50, "mix@upi".into());
            }
        }));
    }

    // Operators process withdrawals while tournaments settle.
    {
        let arena = arena.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..200 {
                for request in arena.pending_withdrawals() {
                    let _ = arena.process_withdrawal(request.id, Payout::Paid);
                }
                let _ = arena.wallets();
                thread::yield_now();
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    stop_deadlock_detector(detector);

    for tournament in tournaments {
        let state = arena.tournament(tournament).unwrap();
        assert!(state.is_completed());
        assert_eq!(state.filled_slots(), PLAYERS / 2);
    }
}
