//! Microphone capture via cpal.
//!
//! The cpal stream is not `Send`, so each take runs it on a dedicated thread
//! that forwards callback buffers into a tokio channel. Dropping the stream is
//! what stops the callbacks; the channel closing marks the final flush.

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc as std_mpsc;
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::capture::{AudioChunk, CaptureError, CaptureHandle, CaptureSource};

const CHUNK_CHANNEL_CAPACITY: usize = 64;

pub struct MicCaptureSource {
    sample_rate: u32,
}

impl MicCaptureSource {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

#[async_trait]
impl CaptureSource for MicCaptureSource {
    async fn open(&self) -> Result<Box<dyn CaptureHandle>, CaptureError> {
        let name = tokio::task::spawn_blocking(|| {
            cpal::default_host()
                .default_input_device()
                .map(|device| device.name().unwrap_or_else(|_| "unknown".to_string()))
        })
        .await
        .map_err(|e| CaptureError::Stream(e.to_string()))?
        .ok_or_else(|| {
            CaptureError::PermissionDenied("no input device available".to_string())
        })?;

        info!("Mic capture using device: {}", name);

        Ok(Box::new(MicCaptureHandle {
            sample_rate: self.sample_rate,
            worker: None,
        }))
    }
}

struct Worker {
    stop_tx: std_mpsc::Sender<()>,
    thread: JoinHandle<()>,
}

pub struct MicCaptureHandle {
    sample_rate: u32,
    worker: Option<Worker>,
}

#[async_trait]
impl CaptureHandle for MicCaptureHandle {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioChunk>, CaptureError> {
        if self.worker.is_some() {
            return Err(CaptureError::Stream("capture already started".to_string()));
        }

        let (chunk_tx, chunk_rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<(), String>>();
        let sample_rate = self.sample_rate;

        let thread = std::thread::spawn(move || {
            let host = cpal::default_host();
            let device = match host.default_input_device() {
                Some(device) => device,
                None => {
                    let _ = ready_tx.send(Err("no input device available".to_string()));
                    return;
                }
            };

            let config = cpal::StreamConfig {
                channels: 1,
                sample_rate: cpal::SampleRate(sample_rate),
                buffer_size: cpal::BufferSize::Default,
            };

            let err_fn = |err| error!("Mic stream error: {}", err);
            let stream = match device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // The callback must not block; a full channel drops the buffer.
                    let _ = chunk_tx.try_send(AudioChunk {
                        samples: data.to_vec(),
                        sample_rate,
                    });
                },
                err_fn,
                None,
            ) {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(e.to_string()));
                return;
            }
            let _ = ready_tx.send(Ok(()));

            // Park until stop; dropping the stream ends the callbacks and the
            // chunk sender with them, which closes the channel.
            let _ = stop_rx.recv();
            debug!("Stopping mic stream");
            drop(stream);
        });

        let ready = tokio::task::spawn_blocking(move || ready_rx.recv())
            .await
            .map_err(|e| CaptureError::Stream(e.to_string()))?
            .map_err(|_| CaptureError::Stream("capture thread exited early".to_string()))?;

        if let Err(e) = ready {
            let _ = thread.join();
            return Err(CaptureError::Stream(e));
        }

        info!("Mic recording started at {} Hz", sample_rate);
        self.worker = Some(Worker { stop_tx, thread });
        Ok(chunk_rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        let _ = worker.stop_tx.send(());
        tokio::task::spawn_blocking(move || worker.thread.join())
            .await
            .map_err(|e| CaptureError::Stream(e.to_string()))?
            .map_err(|_| CaptureError::Stream("capture thread panicked".to_string()))?;

        info!("Mic recording stopped");
        Ok(())
    }
}

impl Drop for MicCaptureHandle {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            debug!("Dropping active mic capture, signalling stop");
            let _ = worker.stop_tx.send(());
        }
    }
}
