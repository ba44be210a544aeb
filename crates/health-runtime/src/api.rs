//! HTTP read API over the shared registry.
//!
//! Routes:
//!   GET /                              - status message
//!   GET /api/v1/client/{client_id}     - one client profile (exact id)
//!   GET /api/v1/clients?limit&offset   - page of client profiles
//!   GET /api/v1/health-programs        - every stored program
//!
//! Every body is `{"success": bool, "data": ...}` or
//! `{"success": bool, "message": "..."}`.

use std::future::Future;
use std::sync::OnceLock;

use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono_tz::Tz;
use health_core::error::{HealthError, Result};
use health_core::lookup::ProgramDirectory;
use health_core::projection::{ClientProfile, ProgramSummary};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::registry::SharedRegistry;

pub const API_PREFIX: &str = "/api/v1";

pub const DEFAULT_LIMIT: usize = 10;
pub const DEFAULT_OFFSET: usize = 0;

// ── Envelope ──────────────────────────────────────────────────────────────────

/// Uniform response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn message(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Status plus envelope, as returned by every handler.
pub type ApiReply<T> = (StatusCode, Json<ApiResponse<T>>);

fn reply<T>(status: StatusCode, body: ApiResponse<T>) -> ApiReply<T> {
    (status, Json(body))
}

fn failure<T>(status: StatusCode, message: impl Into<String>) -> ApiReply<T> {
    reply(status, ApiResponse::message(false, message))
}

// ── State ─────────────────────────────────────────────────────────────────────

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    pub registry: SharedRegistry,
    /// Zone used for the formatted timestamps in projections.
    pub timezone: Tz,
}

impl ApiState {
    pub fn new(registry: SharedRegistry, timezone: Tz) -> Self {
        Self { registry, timezone }
    }
}

// ── Validation ────────────────────────────────────────────────────────────────

/// `true` when `client_id` consists only of ASCII letters, digits and `-`.
pub fn is_valid_client_id(client_id: &str) -> bool {
    static CLIENT_ID_RE: OnceLock<Regex> = OnceLock::new();
    CLIENT_ID_RE
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9-]+$").expect("regex is valid"))
        .is_match(client_id)
}

/// Raw pagination parameters; parsed by hand so bad values get the standard
/// envelope instead of the extractor's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl PageParams {
    /// `(offset, limit)` with defaults applied.
    pub fn resolve(&self) -> std::result::Result<(usize, usize), String> {
        let offset = parse_count(self.offset.as_deref(), "offset", DEFAULT_OFFSET)?;
        let limit = parse_count(self.limit.as_deref(), "limit", DEFAULT_LIMIT)?;
        Ok((offset, limit))
    }
}

fn parse_count(raw: Option<&str>, name: &str, default: usize) -> std::result::Result<usize, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value
            .parse::<usize>()
            .map_err(|_| format!("{name} must be a non-negative integer")),
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

pub async fn home() -> ApiReply<()> {
    reply(
        StatusCode::OK,
        ApiResponse::message(true, "Health Program Management API v1 is running."),
    )
}

/// Undecodable path segments are reported in the envelope like any other
/// malformed id.
pub async fn get_client_profile(
    State(state): State<ApiState>,
    client_id: std::result::Result<Path<String>, PathRejection>,
) -> ApiReply<ClientProfile> {
    let client_id = match client_id {
        Ok(Path(client_id)) => client_id,
        Err(rejection) => {
            tracing::debug!(%rejection, "rejected undecodable client id");
            return failure(StatusCode::BAD_REQUEST, "Invalid client ID format.");
        }
    };
    if !is_valid_client_id(&client_id) {
        tracing::debug!(client_id = %client_id, "rejected malformed client id");
        return failure(StatusCode::BAD_REQUEST, "Invalid client ID format.");
    }

    let (programs, clients) = state.registry.both();
    match clients.get_exact(&client_id) {
        Some(client) => {
            let directory = ProgramDirectory::new(programs.programs());
            let profile = ClientProfile::new(client, &directory, &state.timezone);
            reply(StatusCode::OK, ApiResponse::data(profile))
        }
        None => failure(StatusCode::NOT_FOUND, "Client not found"),
    }
}

pub async fn get_all_clients(
    State(state): State<ApiState>,
    Query(params): Query<PageParams>,
) -> ApiReply<Vec<ClientProfile>> {
    let (offset, limit) = match params.resolve() {
        Ok(window) => window,
        Err(message) => {
            tracing::debug!(%message, "rejected pagination parameters");
            return failure(StatusCode::BAD_REQUEST, message);
        }
    };

    let (programs, clients) = state.registry.both();
    let directory = ProgramDirectory::new(programs.programs());
    let profiles = clients
        .page(offset, limit)
        .iter()
        .map(|c| ClientProfile::new(c, &directory, &state.timezone))
        .collect();
    reply(StatusCode::OK, ApiResponse::data(profiles))
}

/// Served from the live program store.
pub async fn get_health_programs(State(state): State<ApiState>) -> ApiReply<Vec<ProgramSummary>> {
    let programs = state.registry.programs();
    let summaries = programs
        .programs()
        .iter()
        .map(|p| ProgramSummary::new(p, &state.timezone))
        .collect();
    reply(StatusCode::OK, ApiResponse::data(summaries))
}

pub async fn not_found() -> ApiReply<()> {
    failure(StatusCode::NOT_FOUND, "Resource not found")
}

// ── Router / server ───────────────────────────────────────────────────────────

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(home))
        .route(&format!("{API_PREFIX}/client/:client_id"), get(get_client_profile))
        .route(&format!("{API_PREFIX}/clients"), get(get_all_clients))
        .route(&format!("{API_PREFIX}/health-programs"), get(get_health_programs))
        .fallback(not_found)
        .with_state(state)
}

/// Serve the API on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: ApiState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!("HTTP API listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(HealthError::Io)
}
