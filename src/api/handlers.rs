//! HTTP endpoint handlers
//!
//! Intents that are invalid in the current timer state are not errors: they
//! come back with status "ignored" and the unchanged widget view, matching
//! the silent-rejection semantics of the engine itself.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info};

use crate::state::{AppState, IntentOutcome, TimerState};

use super::responses::{ApiResponse, HealthResponse, StatusResponse};

fn respond(outcome: IntentOutcome, applied_msg: &str, ignored_msg: &str) -> Json<ApiResponse> {
    if outcome.applied {
        Json(ApiResponse::applied(applied_msg.to_string(), outcome.view))
    } else {
        Json(ApiResponse::ignored(ignored_msg.to_string(), outcome.view))
    }
}

/// Handle POST /digit/:digit - Press a keypad digit
pub async fn digit_handler(
    State(state): State<Arc<AppState>>,
    Path(digit): Path<String>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let mut chars = digit.chars();
    let digit = match (chars.next(), chars.next()) {
        (Some(d), None) if d.is_ascii_digit() => d,
        _ => return Err(StatusCode::BAD_REQUEST),
    };

    match state.press_digit(digit) {
        Ok(outcome) => Ok(respond(
            outcome,
            &format!("Digit '{}' appended", digit),
            "Digit ignored (timer running or input full)",
        )),
        Err(e) => {
            error!("Failed to press digit: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /delete - Remove the last pending digit
pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.delete_digit() {
        Ok(outcome) => Ok(respond(
            outcome,
            "Last digit removed",
            "Delete ignored (timer running or input empty)",
        )),
        Err(e) => {
            error!("Failed to delete digit: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /clear - Clear pending input and zero the session
pub async fn clear_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.clear_input() {
        Ok(outcome) => Ok(respond(
            outcome,
            "Input cleared",
            "Clear ignored (timer running)",
        )),
        Err(e) => {
            error!("Failed to clear input: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /toggle - Start, pause, or resume the countdown
pub async fn toggle_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.toggle() {
        Ok(outcome) => {
            let applied_msg = match outcome.view.state {
                TimerState::Running => "Countdown running",
                TimerState::Paused => "Countdown paused",
                TimerState::Idle => "Countdown idle",
            };
            if outcome.applied {
                info!("Toggle accepted: {}", applied_msg);
            }
            Ok(respond(
                outcome,
                applied_msg,
                "Toggle ignored (nothing to start or resume)",
            ))
        }
        Err(e) => {
            error!("Failed to toggle countdown: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /reset - Reset the countdown to the configured duration
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.reset() {
        Ok(outcome) => {
            info!("Countdown reset");
            Ok(respond(outcome, "Countdown reset", "Countdown reset"))
        }
        Err(e) => {
            error!("Failed to reset countdown: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /status - Return the observable widget state
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let widget = match state.view() {
        Ok(view) => view,
        Err(e) => {
            error!("Failed to get widget view: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        widget,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
