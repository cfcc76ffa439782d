//! Take control endpoints.
//!
//! Provides HTTP endpoints for:
//! - Starting a take (POST /start)
//! - Finishing a take (POST /stop)
//! - Aborting a take (POST /cancel)
//! - Reading session status (GET /status)

use crate::api::error::{ApiError, ApiResult};
use crate::config::TakeDefaults;
use crate::session::{ConfigError, Genre, Meter, MrType, TakeConfig, TakeStatusHandle};
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Request body for the start endpoint. Every field is optional; missing
/// fields fall back to the configured take defaults.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub tempo_bpm: Option<u32>,
    #[serde(default)]
    pub meter: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub slow_mode: Option<bool>,
    #[serde(default)]
    pub mr_type: Option<String>,
    #[serde(default)]
    pub max_duration_seconds: Option<u64>,
}

#[derive(Clone)]
pub enum ApiCommand {
    StartTake(TakeConfig),
    StopTake,
    CancelTake,
}

#[derive(Clone)]
pub struct SessionState {
    pub tx: mpsc::Sender<ApiCommand>,
    pub status: TakeStatusHandle,
    pub defaults: TakeDefaults,
}

pub fn router(state: SessionState) -> Router {
    Router::new()
        .route("/start", post(start_take))
        .route("/stop", post(stop_take))
        .route("/cancel", post(cancel_take))
        .route("/status", get(session_status))
        .with_state(state)
}

/// Merge request overrides into the configured defaults.
pub fn resolve_config(
    defaults: &TakeDefaults,
    request: &StartRequest,
) -> Result<TakeConfig, ConfigError> {
    let meter = match &request.meter {
        Some(label) => Meter::from_label(label)?,
        None => defaults.meter,
    };
    let genre = match &request.genre {
        Some(label) => Some(Genre::from_label(label)?),
        None => defaults.genre,
    };
    let mr_type = match &request.mr_type {
        Some(label) => MrType::from_label(label)?,
        None => defaults.mr_type,
    };

    TakeConfig::new(
        request.tempo_bpm.unwrap_or(defaults.tempo_bpm),
        meter,
        genre,
        request.slow_mode.unwrap_or(defaults.slow_mode),
        mr_type,
        Duration::from_secs(
            request
                .max_duration_seconds
                .unwrap_or(defaults.max_duration_seconds),
        ),
    )
}

async fn start_take(
    State(state): State<SessionState>,
    body: Option<Json<StartRequest>>,
) -> ApiResult<Json<Value>> {
    let request = body.map(|Json(req)| req).unwrap_or_default();
    let config =
        resolve_config(&state.defaults, &request).map_err(|e| ApiError::bad_request(e.to_string()))?;

    info!(
        "Start take requested via API: {} bpm, {}",
        config.tempo_bpm,
        config.meter.as_str()
    );

    send_command(&state, ApiCommand::StartTake(config)).await?;
    Ok(Json(phase_response(&state).await))
}

async fn stop_take(State(state): State<SessionState>) -> ApiResult<Json<Value>> {
    info!("Stop take requested via API");
    send_command(&state, ApiCommand::StopTake).await?;
    Ok(Json(phase_response(&state).await))
}

async fn cancel_take(State(state): State<SessionState>) -> ApiResult<Json<Value>> {
    info!("Cancel take requested via API");
    send_command(&state, ApiCommand::CancelTake).await?;
    Ok(Json(phase_response(&state).await))
}

async fn send_command(state: &SessionState, command: ApiCommand) -> ApiResult<()> {
    state.tx.send(command).await.map_err(|e| {
        error!("Failed to send session command: {}", e);
        ApiError::internal("session command channel closed")
    })
}

/// Give the service loop a moment to apply the command, then report where the
/// session landed.
async fn phase_response(state: &SessionState) -> Value {
    tokio::time::sleep(Duration::from_millis(50)).await;
    let status = state.status.get().await;
    json!({
        "success": true,
        "phase": status.phase.as_str(),
    })
}

async fn session_status(State(state): State<SessionState>) -> Json<Value> {
    let status = state.status.get().await;

    let last_take = status.last_take.as_ref().map(|take| {
        json!({
            "take_id": take.take_id,
            "completed_at": take.completed_at.to_rfc3339(),
            "transcription": take.transcription,
        })
    });

    Json(json!({
        "recording": status.phase == crate::session::TakePhase::Recording,
        "phase": status.phase.as_str(),
        "last_take": last_take,
        "last_error": status.last_error,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> TakeDefaults {
        TakeDefaults::default()
    }

    #[test]
    fn empty_request_uses_defaults() {
        let config = resolve_config(&defaults(), &StartRequest::default()).unwrap();
        assert_eq!(config.tempo_bpm, 120);
        assert_eq!(config.meter, Meter::FourFour);
        assert_eq!(config.max_duration, Duration::from_secs(60));
    }

    #[test]
    fn overrides_replace_defaults_field_by_field() {
        let request = StartRequest {
            tempo_bpm: Some(96),
            meter: Some("7/8".to_string()),
            genre: Some("jazz".to_string()),
            slow_mode: Some(true),
            mr_type: Some("backing".to_string()),
            max_duration_seconds: Some(30),
        };
        let config = resolve_config(&defaults(), &request).unwrap();
        assert_eq!(config.tempo_bpm, 96);
        assert_eq!(config.meter, Meter::SevenEight);
        assert_eq!(config.genre, Some(Genre::Jazz));
        assert!(config.slow_mode);
        assert_eq!(config.mr_type, MrType::Backing);
        assert_eq!(config.max_duration, Duration::from_secs(30));
    }

    #[test]
    fn bad_labels_are_rejected() {
        let request = StartRequest {
            meter: Some("4/5".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            resolve_config(&defaults(), &request),
            Err(ConfigError::UnknownMeter(_))
        ));

        let request = StartRequest {
            genre: Some("polka".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            resolve_config(&defaults(), &request),
            Err(ConfigError::UnknownGenre(_))
        ));
    }
}
