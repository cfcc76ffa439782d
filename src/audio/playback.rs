//! Clip playback for the count-in and the metronome click.
//!
//! Clips are synthesized rather than bundled: each count beat is a short tone
//! with its own pitch, the click a higher damped tick.

use async_trait::async_trait;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::f32::consts::PI;
use std::sync::mpsc as std_mpsc;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

use crate::session::Clip;

const RENDER_SAMPLE_RATE: u32 = 44_100;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("audio output unavailable: {0}")]
    Output(String),
    #[error("clip playback failed: {0}")]
    Play(String),
}

/// Plays short clips to the default output.
#[async_trait]
pub trait ClipPlayer: Send + Sync {
    /// Play a clip and resolve once it has finished sounding.
    async fn play(&self, clip: Clip) -> Result<(), PlaybackError>;

    /// Fire a metronome tick: restart the clip from time zero, cutting off
    /// any tick still sounding. Returns as soon as playback is queued.
    fn click(&self, clip: Clip) -> Result<(), PlaybackError>;
}

/// rodio-backed player. The output stream is not `Send`, so a dedicated
/// thread owns it for the life of the process and hands back the mixer handle.
pub struct RodioPlayer {
    handle: OutputStreamHandle,
    click_sink: Mutex<Option<Sink>>,
}

impl RodioPlayer {
    pub fn new() -> Result<Self, PlaybackError> {
        let (tx, rx) = std_mpsc::channel();
        std::thread::spawn(move || match OutputStream::try_default() {
            Ok((stream, handle)) => {
                if tx.send(Ok(handle)).is_ok() {
                    // Keep the stream alive; the mixer handle stays valid only
                    // while this thread holds it.
                    std::thread::park();
                }
                drop(stream);
            }
            Err(e) => {
                let _ = tx.send(Err(e.to_string()));
            }
        });

        let handle = rx
            .recv()
            .map_err(|_| PlaybackError::Output("audio output thread died".to_string()))?
            .map_err(PlaybackError::Output)?;

        debug!("Audio output ready");
        Ok(Self {
            handle,
            click_sink: Mutex::new(None),
        })
    }
}

#[async_trait]
impl ClipPlayer for RodioPlayer {
    async fn play(&self, clip: Clip) -> Result<(), PlaybackError> {
        let sink = Sink::try_new(&self.handle).map_err(|e| PlaybackError::Play(e.to_string()))?;
        sink.append(SamplesBuffer::new(1, RENDER_SAMPLE_RATE, render(clip)));
        tokio::task::spawn_blocking(move || sink.sleep_until_end())
            .await
            .map_err(|e| PlaybackError::Play(e.to_string()))?;
        Ok(())
    }

    fn click(&self, clip: Clip) -> Result<(), PlaybackError> {
        let mut guard = self
            .click_sink
            .lock()
            .map_err(|_| PlaybackError::Play("click sink poisoned".to_string()))?;

        // Replacing the sink cuts off an in-flight tick and restarts from zero.
        if let Some(old) = guard.take() {
            old.stop();
        }
        let sink = Sink::try_new(&self.handle).map_err(|e| PlaybackError::Play(e.to_string()))?;
        sink.append(SamplesBuffer::new(1, RENDER_SAMPLE_RATE, render(clip)));
        *guard = Some(sink);
        Ok(())
    }
}

/// Render a clip into mono samples at `RENDER_SAMPLE_RATE`.
fn render(clip: Clip) -> Vec<f32> {
    match clip {
        Clip::Count(beat) => tone(count_pitch_hz(beat), 0.12, 0.35),
        Clip::Click => tone(1_800.0, 0.03, 0.5),
    }
}

/// Pitch for count beat `n` (1-based): an ascending whole-tone ladder so each
/// spoken-number slot is audibly distinct.
fn count_pitch_hz(beat: u8) -> f32 {
    440.0 * 2f32.powf(f32::from(beat.saturating_sub(1)) * 2.0 / 12.0)
}

fn tone(freq_hz: f32, duration_secs: f32, gain: f32) -> Vec<f32> {
    let total = (RENDER_SAMPLE_RATE as f32 * duration_secs) as usize;
    let mut samples = Vec::with_capacity(total);
    for i in 0..total {
        let t = i as f32 / RENDER_SAMPLE_RATE as f32;
        let envelope = (1.0 - t / duration_secs).max(0.0);
        samples.push((t * freq_hz * 2.0 * PI).sin() * envelope * gain);
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_pitches_ascend() {
        let pitches: Vec<f32> = (1..=7).map(count_pitch_hz).collect();
        assert!((pitches[0] - 440.0).abs() < f32::EPSILON);
        assert!(pitches.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn rendered_clips_are_non_empty_and_bounded() {
        for clip in [Clip::Count(1), Clip::Count(5), Clip::Click] {
            let samples = render(clip);
            assert!(!samples.is_empty());
            assert!(samples.iter().all(|s| s.abs() <= 1.0));
        }
    }
}
