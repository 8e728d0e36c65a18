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

use arena_ledger::{AdminGateway, Arena, ArenaConfig, Command, MemoryJournal, TournamentStatus};
use clap::{Parser, ValueEnum};
use csv::Writer;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Arena Ledger - Replay operator and player commands
///
/// Reads one JSON command per line, applies each through the admin gateway
/// and writes the resulting report as CSV to stdout. Rejected commands are
/// logged to stderr and skipped.
#[derive(Parser, Debug)]
#[command(name = "arena-ledger")]
#[command(about = "Replays tournament marketplace commands and reports the outcome", long_about = None)]
struct Args {
    /// Path to a JSON-lines command file
    ///
    /// Example line: {"type": "credit", "user": 1, "amount": 500}
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// JSON file with arena settings
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Start with player actions disabled
    #[arg(long)]
    maintenance: bool,

    /// Write every committed event as JSON lines to this file
    #[arg(long, value_name = "PATH")]
    journal: Option<PathBuf>,

    /// Which report to print
    #[arg(long, value_enum, default_value_t = Report::Wallets)]
    report: Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Report {
    Wallets,
    Tournaments,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error reading config '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => ArenaConfig::default(),
    };
    if args.maintenance {
        config.maintenance_mode = true;
    }

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let journal = Arc::new(MemoryJournal::new());
    let arena = Arena::with_journal(config, journal.clone());
    let gateway = AdminGateway::new(Arc::new(arena));

    let summary = match replay(BufReader::new(file), &gateway) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error reading commands: {}", e);
            process::exit(1);
        }
    };
    info!(
        applied = summary.applied,
        rejected = summary.rejected,
        malformed = summary.malformed,
        "replay finished"
    );

    if let Some(path) = &args.journal {
        if let Err(e) = write_journal(&journal, path) {
            eprintln!("Error writing journal '{}': {}", path.display(), e);
            process::exit(1);
        }
    }

    let written = match args.report {
        Report::Wallets => write_wallets(gateway.arena(), std::io::stdout()),
        Report::Tournaments => write_tournaments(gateway.arena(), std::io::stdout()),
    };
    if let Err(e) = written {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

fn load_config(path: &Path) -> Result<ArenaConfig, Box<dyn std::error::Error>> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Outcome counts of a replay.
#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    applied: usize,
    rejected: usize,
    malformed: usize,
}

/// Applies every command line from `reader`.
///
/// Blank lines and lines starting with `#` are ignored. Lines that are not
/// valid commands and commands the arena rejects are logged and skipped.
///
/// # Errors
///
/// Returns an I/O error if the reader fails.
fn replay<R: BufRead>(reader: R, gateway: &AdminGateway) -> std::io::Result<Summary> {
    let mut summary = Summary::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line_number = index + 1;

        let command: Command = match serde_json::from_str(trimmed) {
            Ok(command) => command,
            Err(e) => {
                warn!(line = line_number, error = %e, "skipping malformed command");
                summary.malformed += 1;
                continue;
            }
        };

        match gateway.execute(command) {
            Ok(_) => summary.applied += 1,
            Err(e) => {
                warn!(line = line_number, code = e.code(), error = %e, "command rejected");
                summary.rejected += 1;
            }
        }
    }

    Ok(summary)
}

/// Minor currency units per major unit, as a decimal scale.
const MINOR_UNIT_SCALE: u32 = 2;

fn major_units(amount: u64) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(amount), MINOR_UNIT_SCALE)
}

#[derive(Debug, Serialize)]
struct WalletRow {
    user: u32,
    balance: Decimal,
}

/// Writes `user,balance` rows with balances in major units.
fn write_wallets<W: Write>(arena: &Arena, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for wallet in arena.wallets() {
        wtr.serialize(WalletRow {
            user: wallet.user.0,
            balance: major_units(wallet.balance),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct TournamentRow {
    id: u32,
    title: String,
    game: String,
    status: TournamentStatus,
    capacity: u32,
    filled_slots: u32,
    winner: Option<u32>,
    entry_fee: Decimal,
    prize_pool: Decimal,
}

fn write_tournaments<W: Write>(arena: &Arena, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for tournament in arena.tournaments() {
        wtr.serialize(TournamentRow {
            id: tournament.id.0,
            capacity: tournament.capacity(),
            filled_slots: tournament.filled_slots(),
            title: tournament.title,
            game: tournament.game,
            status: tournament.status,
            winner: tournament.winner.map(|user| user.0),
            entry_fee: major_units(tournament.entry_fee),
            prize_pool: major_units(tournament.prize_pool),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_journal(
    journal: &MemoryJournal,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = File::create(path)?;
    for event in journal.drain_unflushed() {
        serde_json::to_writer(&mut file, &event)?;
        file.write_all(b"\n")?;
    }
    file.flush()?;
    Ok(())
}
