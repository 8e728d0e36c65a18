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

//! Admin gateway: the command contract between front ends and the arena.
//!
//! Front ends send [`Command`]s as JSON:
//!
//! ```json
//! {"type": "decide_registration", "registration": 4, "decision": "APPROVED"}
//! ```
//!
//! Commands are validated before dispatch so malformed input never reaches
//! the state machines. Caller authorization happens upstream.

use crate::ArenaError;
use crate::arena::Arena;
use crate::base::{Amount, RegistrationId, TournamentId, UserId, WithdrawalId};
use crate::config::ArenaConfig;
use crate::registration::{Decision, Evidence, Registration};
use crate::settlement::{Payout, WithdrawalRequest};
use crate::tournament::{NewTournament, Tournament};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    CreateTournament {
        title: String,
        game: String,
        entry_fee: Amount,
        prize_pool: Amount,
        capacity: u32,
    },
    StartTournament {
        tournament: TournamentId,
    },
    SetRoomDetails {
        tournament: TournamentId,
        details: String,
    },
    SubmitRegistration {
        tournament: TournamentId,
        user: UserId,
        game_id: String,
        game_uid: String,
        payment_reference: String,
    },
    DecideRegistration {
        registration: RegistrationId,
        decision: Decision,
    },
    DeclareWinner {
        tournament: TournamentId,
        user: UserId,
        prize: Amount,
    },
    RequestWithdrawal {
        user: UserId,
        amount: Amount,
        destination: String,
    },
    ProcessWithdrawal {
        withdrawal: WithdrawalId,
        payout: Payout,
    },
    Credit {
        user: UserId,
        amount: Amount,
    },
    SetMaintenance {
        enabled: bool,
    },
}

/// Result of a successfully executed [`Command`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Response {
    Tournament(Tournament),
    Submitted { registration: RegistrationId },
    Registration(Registration),
    WithdrawalRequested { withdrawal: WithdrawalId },
    Withdrawal(WithdrawalRequest),
    Balance { user: UserId, balance: Amount },
    Settings(ArenaConfig),
}

fn required(field: &str, value: &str) -> Result<(), ArenaError> {
    if value.trim().is_empty() {
        return Err(ArenaError::InvalidRequest(format!("{field} is required")));
    }
    Ok(())
}

fn positive(field: &str, value: Amount) -> Result<(), ArenaError> {
    if value == 0 {
        return Err(ArenaError::InvalidRequest(format!("{field} must be positive")));
    }
    Ok(())
}

impl Command {
    /// Checks field-level rules that do not need arena state.
    pub fn validate(&self) -> Result<(), ArenaError> {
        match self {
            Command::CreateTournament {
                title,
                game,
                capacity,
                ..
            } => {
                required("title", title)?;
                required("game", game)?;
                positive("capacity", Amount::from(*capacity))
            }
            Command::SetRoomDetails { details, .. } => required("details", details),
            Command::SubmitRegistration {
                game_id,
                game_uid,
                payment_reference,
                ..
            } => {
                required("game_id", game_id)?;
                required("game_uid", game_uid)?;
                required("payment_reference", payment_reference)
            }
            Command::DeclareWinner { prize, .. } => positive("prize", *prize),
            Command::RequestWithdrawal {
                amount,
                destination,
                ..
            } => {
                positive("amount", *amount)?;
                required("destination", destination)
            }
            Command::Credit { amount, .. } => positive("amount", *amount),
            Command::StartTournament { .. }
            | Command::DecideRegistration { .. }
            | Command::ProcessWithdrawal { .. }
            | Command::SetMaintenance { .. } => Ok(()),
        }
    }
}

/// Validates and dispatches commands against a shared [`Arena`].
#[derive(Clone)]
pub struct AdminGateway {
    arena: Arc<Arena>,
}

impl AdminGateway {
    pub fn new(arena: Arc<Arena>) -> Self {
        Self { arena }
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn execute(&self, command: Command) -> Result<Response, ArenaError> {
        command.validate()?;
        let arena = &self.arena;
        let response = match command {
            Command::CreateTournament {
                title,
                game,
                entry_fee,
                prize_pool,
                capacity,
            } => Response::Tournament(arena.create_tournament(NewTournament {
                title: title.trim().to_string(),
                game: game.trim().to_string(),
                entry_fee,
                prize_pool,
                capacity,
            })?),
            Command::StartTournament { tournament } => {
                Response::Tournament(arena.start_tournament(tournament)?)
            }
            Command::SetRoomDetails {
                tournament,
                details,
            } => Response::Tournament(arena.set_room_details(tournament, details)?),
            Command::SubmitRegistration {
                tournament,
                user,
                game_id,
                game_uid,
                payment_reference,
            } => {
                let evidence = Evidence {
                    game_id: game_id.trim().to_string(),
                    game_uid: game_uid.trim().to_string(),
                    payment_reference: payment_reference.trim().to_string(),
                };
                Response::Submitted {
                    registration: arena.submit_registration(tournament, user, evidence)?,
                }
            }
            Command::DecideRegistration {
                registration,
                decision,
            } => Response::Registration(arena.decide_registration(registration, decision)?),
            Command::DeclareWinner {
                tournament,
                user,
                prize,
            } => Response::Tournament(arena.declare_winner(tournament, user, prize)?),
            Command::RequestWithdrawal {
                user,
                amount,
                destination,
            } => Response::WithdrawalRequested {
                withdrawal: arena.request_withdrawal(
                    user,
                    amount,
                    destination.trim().to_string(),
                )?,
            },
            Command::ProcessWithdrawal { withdrawal, payout } => {
                Response::Withdrawal(arena.process_withdrawal(withdrawal, payout)?)
            }
            Command::Credit { user, amount } => Response::Balance {
                user,
                balance: arena.credit(user, amount)?,
            },
            Command::SetMaintenance { enabled } => {
                let mut config = arena.config();
                config.maintenance_mode = enabled;
                arena.set_config(config.clone());
                Response::Settings(config)
            }
        };
        Ok(response)
    }

    pub fn balance(&self, user: UserId) -> Response {
        Response::Balance {
            user,
            balance: self.arena.wallet_balance(user),
        }
    }
}
