//! Take lifecycle phases and the shared status snapshot.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::backend::BeatTranscription;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakePhase {
    Idle,
    CountingIn,
    Recording,
    Stopping,
}

impl TakePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TakePhase::Idle => "idle",
            TakePhase::CountingIn => "counting_in",
            TakePhase::Recording => "recording",
            TakePhase::Stopping => "stopping",
        }
    }
}

/// Result of a take that ran to an uploaded, transcribed artifact.
#[derive(Debug, Clone)]
pub struct CompletedTake {
    pub take_id: String,
    pub completed_at: DateTime<Utc>,
    pub transcription: BeatTranscription,
}

#[derive(Debug, Clone)]
pub struct TakeStatus {
    pub phase: TakePhase,
    pub last_error: Option<String>,
    pub last_take: Option<CompletedTake>,
}

impl Default for TakeStatus {
    fn default() -> Self {
        Self {
            phase: TakePhase::Idle,
            last_error: None,
            last_take: None,
        }
    }
}

/// Cloneable handle over the current take status, shared between the session
/// machine and the API/CLI readers.
#[derive(Clone, Default)]
pub struct TakeStatusHandle {
    inner: Arc<Mutex<TakeStatus>>,
}

impl TakeStatusHandle {
    pub async fn get(&self) -> TakeStatus {
        self.inner.lock().await.clone()
    }

    pub async fn set_phase(&self, phase: TakePhase) {
        self.inner.lock().await.phase = phase;
    }

    pub async fn set_error(&self, phase: TakePhase, error: String) {
        let mut status = self.inner.lock().await;
        status.phase = phase;
        status.last_error = Some(error);
    }

    pub async fn record_completed(&self, take: CompletedTake) {
        let mut status = self.inner.lock().await;
        status.phase = TakePhase::Idle;
        status.last_error = None;
        status.last_take = Some(take);
    }
}
