use crate::api::{ApiCommand, ApiServer};
use crate::audio::{CaptureSource, ClipPlayer, MicCaptureSource, RodioPlayer};
use crate::backend::{BeatBackend, HttpBeatBackend};
use crate::config::Config;
use crate::session::{RecordingSession, TakeStatusHandle};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

pub async fn run_service() -> Result<()> {
    info!("Starting beatscribe service");

    let config = Config::load()?;
    let port = config.api.port;

    let (tx, mut rx) = mpsc::channel::<ApiCommand>(10);

    let player: Arc<dyn ClipPlayer> = Arc::new(RodioPlayer::new()?);
    let capture: Arc<dyn CaptureSource> =
        Arc::new(MicCaptureSource::new(config.audio.sample_rate));
    let backend: Arc<dyn BeatBackend> = Arc::new(HttpBeatBackend::new(&config.backend.base_url));

    let status = TakeStatusHandle::default();
    let session = RecordingSession::new(player, capture, backend, status.clone());

    let api_server = ApiServer::new(tx, status, &config);
    tokio::spawn(async move {
        if let Err(e) = api_server.start().await {
            error!("API server failed: {}", e);
        }
    });

    info!("beatscribe is ready!");
    info!(
        "Start a take: curl -X POST http://127.0.0.1:{}/start -d '{{\"tempo_bpm\": 120}}'",
        port
    );
    info!("Finish it:    curl -X POST http://127.0.0.1:{}/stop", port);

    while let Some(command) = rx.recv().await {
        match command {
            ApiCommand::StartTake(take_config) => match session.start(take_config).await {
                Ok(phase) => info!("Session is {}", phase.as_str()),
                Err(e) => error!("Failed to start take: {}", e),
            },
            ApiCommand::StopTake => {
                let phase = session.stop().await;
                info!("Stop handled while {}", phase.as_str());
            }
            ApiCommand::CancelTake => {
                let phase = session.cancel().await;
                info!("Cancel handled while {}", phase.as_str());
            }
        }
    }

    Ok(())
}
