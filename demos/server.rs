//! REST front for the admin gateway.
//!
//! Run with: `cargo run --example server`
//!
//! # Example requests
//!
//! ```bash
//! # Publish a tournament
//! curl -X POST http://localhost:3000/commands \
//!   -H "Content-Type: application/json" \
//!   -d '{"type": "create_tournament", "title": "Night Cup", "game": "BGMI", "entry_fee": 5000, "prize_pool": 100000, "capacity": 2}'
//!
//! # Player claims a slot
//! curl -X POST http://localhost:3000/commands \
//!   -H "Content-Type: application/json" \
//!   -d '{"type": "submit_registration", "tournament": 1, "user": 7, "game_id": "Ace", "game_uid": "5123", "payment_reference": "UTR99"}'
//!
//! # Operator approves it
//! curl -X POST http://localhost:3000/commands \
//!   -H "Content-Type: application/json" \
//!   -d '{"type": "decide_registration", "registration": 1, "decision": "APPROVED"}'
//!
//! # Wallet balance
//! curl http://localhost:3000/wallets/7
//! ```

use arena_ledger::{AdminGateway, Arena, ArenaError, Command, Response as GatewayResponse};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

#[derive(Clone)]
pub struct AppState {
    pub gateway: AdminGateway,
}

// === Error Handling ===

/// Wrapper for converting `ArenaError` into HTTP responses.
pub struct AppError(ArenaError);

impl From<ArenaError> for AppError {
    fn from(err: ArenaError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ArenaError::NotFound(_) => StatusCode::NOT_FOUND,
            ArenaError::AlreadyDecided
            | ArenaError::InvalidState(_)
            | ArenaError::DuplicateRegistration
            | ArenaError::CapacityExceeded => StatusCode::CONFLICT,
            ArenaError::InsufficientFunds => StatusCode::UNPROCESSABLE_ENTITY,
            ArenaError::InvalidAmount | ArenaError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ArenaError::Maintenance => StatusCode::SERVICE_UNAVAILABLE,
            ArenaError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: self.0.code().to_string(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

/// POST /commands - Execute a gateway command.
async fn execute(
    State(state): State<AppState>,
    Json(command): Json<Command>,
) -> Result<Json<GatewayResponse>, AppError> {
    Ok(Json(state.gateway.execute(command)?))
}

/// GET /wallets/:id - Wallet balance of a user.
async fn wallet(State(state): State<AppState>, Path(id): Path<u32>) -> Json<GatewayResponse> {
    Json(state.gateway.balance(arena_ledger::UserId(id)))
}

/// GET /tournaments - Every tournament.
async fn tournaments(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.gateway.arena().tournaments())
}

/// GET /registrations/pending - The operator's review queue.
async fn pending_registrations(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.gateway.arena().pending_registrations())
}

/// GET /withdrawals/pending - Requests awaiting payout.
async fn pending_withdrawals(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.gateway.arena().pending_withdrawals())
}

// === Router ===

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/commands", post(execute))
        .route("/wallets/{id}", get(wallet))
        .route("/tournaments", get(tournaments))
        .route("/registrations/pending", get(pending_registrations))
        .route("/withdrawals/pending", get(pending_withdrawals))
        .with_state(state)
}

// === Main ===

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let state = AppState {
        gateway: AdminGateway::new(Arc::new(Arena::new())),
    };

    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("arena API server running on http://127.0.0.1:3000");
    println!();
    println!("Endpoints:");
    println!("  POST /commands               - Execute a command");
    println!("  GET  /wallets/:id            - Wallet balance");
    println!("  GET  /tournaments            - List tournaments");
    println!("  GET  /registrations/pending  - Review queue");
    println!("  GET  /withdrawals/pending    - Payout queue");

    axum::serve(listener, app).await?;
    Ok(())
}
