//! The recording session machine.
//!
//! One take runs `Idle → CountingIn → Recording → Stopping → Idle`. The
//! machine owns the capture handle and both timers for the take and releases
//! them on every exit path; `stop` forwards the artifact to the backend,
//! `cancel` discards it.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::audio::{
    encode_wav, AudioChunk, CaptureError, CaptureHandle, CaptureSource, ClipPlayer, PlaybackError,
    WavError,
};
use crate::backend::{BackendError, BeatBackend};
use crate::session::config::{Clip, TakeConfig};
use crate::session::status::{CompletedTake, TakePhase, TakeStatusHandle};

const UPLOAD_FILE_NAME: &str = "recorded.wav";

#[derive(Debug, Error)]
pub enum TakeError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Wav(#[from] WavError),
}

/// Signals into the running take. Owned by the session, cancelled exactly
/// once, dead when the take returns to idle.
struct TakeControls {
    stop: CancellationToken,
    cancel: CancellationToken,
}

pub struct RecordingSession {
    player: Arc<dyn ClipPlayer>,
    capture: Arc<dyn CaptureSource>,
    backend: Arc<dyn BeatBackend>,
    status: TakeStatusHandle,
    active: Arc<Mutex<Option<TakeControls>>>,
}

impl RecordingSession {
    pub fn new(
        player: Arc<dyn ClipPlayer>,
        capture: Arc<dyn CaptureSource>,
        backend: Arc<dyn BeatBackend>,
        status: TakeStatusHandle,
    ) -> Self {
        Self {
            player,
            capture,
            backend,
            status,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Begin a take. No-op while a take is already running; fails without
    /// leaving `Idle` when the microphone is denied.
    pub async fn start(&self, config: TakeConfig) -> Result<TakePhase, TakeError> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            let phase = self.status.get().await.phase;
            warn!("start requested while {}, ignoring", phase.as_str());
            return Ok(phase);
        }

        // Permission gate: the take does not leave Idle unless the mic opens.
        let handle = match self.capture.open().await {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to open microphone: {}", e);
                self.status.set_error(TakePhase::Idle, e.to_string()).await;
                return Err(e.into());
            }
        };

        let controls = TakeControls {
            stop: CancellationToken::new(),
            cancel: CancellationToken::new(),
        };
        let stop = controls.stop.clone();
        let cancel = controls.cancel.clone();
        *active = Some(controls);
        drop(active);

        self.status.set_phase(TakePhase::CountingIn).await;
        info!(
            "Take starting: {} bpm, {} meter, {} count-in beats",
            config.tempo_bpm,
            config.meter.as_str(),
            config.meter.beats_per_measure()
        );

        let player = Arc::clone(&self.player);
        let backend = Arc::clone(&self.backend);
        let status = self.status.clone();
        let active = Arc::clone(&self.active);

        tokio::spawn(async move {
            let result =
                run_take(player, backend, status.clone(), handle, config, stop, cancel).await;
            match result {
                Ok(Some(take)) => {
                    info!("Take {} complete", take.take_id);
                    status.record_completed(take).await;
                }
                Ok(None) => {
                    info!("Take cancelled, no artifact produced");
                    status.set_phase(TakePhase::Idle).await;
                }
                Err(e) => {
                    error!("Take failed: {}", e);
                    status.set_error(TakePhase::Idle, e.to_string()).await;
                }
            }
            active.lock().await.take();
        });

        Ok(TakePhase::CountingIn)
    }

    /// Finish the take and hand the artifact off. Only valid while
    /// `Recording`; anything else is a no-op.
    pub async fn stop(&self) -> TakePhase {
        let active = self.active.lock().await;
        let phase = self.status.get().await.phase;
        match (active.as_ref(), phase) {
            (Some(controls), TakePhase::Recording) => {
                info!("Stop requested");
                controls.stop.cancel();
            }
            _ => warn!("stop requested while {}, ignoring", phase.as_str()),
        }
        phase
    }

    /// Abort the take and discard everything captured so far. Valid from the
    /// count-in onward; a no-op when idle.
    pub async fn cancel(&self) -> TakePhase {
        let active = self.active.lock().await;
        let phase = self.status.get().await.phase;
        match (active.as_ref(), phase) {
            (Some(controls), TakePhase::CountingIn | TakePhase::Recording) => {
                info!("Cancel requested");
                controls.cancel.cancel();
            }
            _ => warn!("cancel requested while {}, ignoring", phase.as_str()),
        }
        phase
    }
}

enum EndReason {
    Stopped,
    Cancelled,
    Failed(TakeError),
}

/// Drive one take to completion. Every path through here stops the capture
/// handle exactly once and lets both timers die before the function returns.
async fn run_take(
    player: Arc<dyn ClipPlayer>,
    backend: Arc<dyn BeatBackend>,
    status: TakeStatusHandle,
    mut handle: Box<dyn CaptureHandle>,
    config: TakeConfig,
    stop: CancellationToken,
    cancel: CancellationToken,
) -> Result<Option<CompletedTake>, TakeError> {
    let take_id = uuid::Uuid::new_v4().to_string();
    let beat = config.beat_interval();

    // Count-in: each clip plays to completion, then one beat interval passes,
    // before the next clip starts. Cancellable at either wait.
    for clip in config.count_in() {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(None),
            played = player.play(clip) => played?,
        }
        tokio::select! {
            _ = cancel.cancelled() => return Ok(None),
            _ = sleep(beat) => {}
        }
    }

    let mut chunks_rx = handle.start().await?;
    status.set_phase(TakePhase::Recording).await;

    let mut chunks: Vec<AudioChunk> = Vec::new();

    // The first click lands one beat after recording begins, matching the
    // count-in spacing.
    let mut click_timer = interval_at(Instant::now() + beat, beat);
    click_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let deadline = sleep(config.max_duration);
    tokio::pin!(deadline);

    let end = loop {
        tokio::select! {
            _ = cancel.cancelled() => break EndReason::Cancelled,
            _ = stop.cancelled() => break EndReason::Stopped,
            _ = &mut deadline => {
                info!("Max take duration reached, stopping");
                break EndReason::Stopped;
            }
            _ = click_timer.tick() => {
                // A failed tick is a degraded metronome, not a failed take.
                if let Err(e) = player.click(Clip::Click) {
                    warn!("Click playback failed: {}", e);
                }
            }
            received = chunks_rx.recv() => match received {
                Some(chunk) => chunks.push(chunk),
                None => break EndReason::Failed(
                    CaptureError::Stream("capture ended unexpectedly".to_string()).into(),
                ),
            }
        }
    };
    // Both timers are dead past this point.

    // A cancelled take goes straight back to idle; only a finishing take
    // passes through the stopping phase.
    if matches!(end, EndReason::Stopped) {
        status.set_phase(TakePhase::Stopping).await;
    }
    if let Err(e) = handle.stop().await {
        warn!("Capture stop failed: {}", e);
    }
    // Final flush: whatever the capture buffered before stopping.
    while let Some(chunk) = chunks_rx.recv().await {
        chunks.push(chunk);
    }

    match end {
        EndReason::Cancelled => Ok(None),
        EndReason::Failed(e) => Err(e),
        EndReason::Stopped => {
            let wav = encode_wav(&chunks)?;
            let filename = backend.upload(wav, UPLOAD_FILE_NAME).await?;
            let transcription = backend.transcribe(&filename).await?;
            Ok(Some(CompletedTake {
                take_id,
                completed_at: chrono::Utc::now(),
                transcription,
            }))
        }
    }
}
