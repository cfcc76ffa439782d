//! One-shot `record` command: run a full take from the terminal.

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::api::routes::session::{resolve_config, StartRequest};
use crate::audio::{CaptureSource, ClipPlayer, MicCaptureSource, RodioPlayer};
use crate::backend::{BeatBackend, HttpBeatBackend};
use crate::cli::args::RecordCliArgs;
use crate::config::Config;
use crate::session::{RecordingSession, TakePhase, TakeStatusHandle};

pub async fn handle_record_command(args: RecordCliArgs) -> Result<()> {
    let config = Config::load()?;

    let request = StartRequest {
        tempo_bpm: args.tempo,
        meter: args.meter,
        genre: args.genre,
        slow_mode: args.slow_mode.then_some(true),
        mr_type: args.mr_type,
        max_duration_seconds: args.duration,
    };
    let take_config = resolve_config(&config.take, &request)?;

    let player: Arc<dyn ClipPlayer> = Arc::new(RodioPlayer::new()?);
    let capture: Arc<dyn CaptureSource> =
        Arc::new(MicCaptureSource::new(config.audio.sample_rate));
    let backend: Arc<dyn BeatBackend> = Arc::new(HttpBeatBackend::new(&config.backend.base_url));

    let status = TakeStatusHandle::default();
    let session = RecordingSession::new(player, capture, backend, status.clone());

    println!(
        "Recording a take at {} bpm in {} ({} count-in beats). Press Ctrl-C to finish.",
        take_config.tempo_bpm,
        take_config.meter.as_str(),
        take_config.meter.beats_per_measure()
    );

    session
        .start(take_config)
        .await
        .context("Failed to start the take")?;

    let mut poll = tokio::time::interval(Duration::from_millis(200));
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                match status.get().await.phase {
                    TakePhase::Recording => {
                        println!("Finishing take...");
                        session.stop().await;
                    }
                    TakePhase::CountingIn => {
                        println!("Aborting count-in...");
                        session.cancel().await;
                    }
                    _ => {}
                }
            }
            _ = poll.tick() => {
                if status.get().await.phase == TakePhase::Idle {
                    break;
                }
            }
        }
    }

    let final_status = status.get().await;
    if let Some(error) = final_status.last_error {
        bail!("Take failed: {}", error);
    }

    match final_status.last_take {
        Some(take) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&take.transcription)
                    .context("Failed to render transcription")?
            );
            Ok(())
        }
        None => {
            println!("Take cancelled, nothing uploaded.");
            Ok(())
        }
    }
}
