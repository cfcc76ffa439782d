//! Capture abstraction for the microphone.
//!
//! A take opens exactly one handle; the handle streams sample chunks over a
//! channel and flushes anything still buffered when stopped.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("microphone access denied or unavailable: {0}")]
    PermissionDenied(String),
    #[error("capture stream failed: {0}")]
    Stream(String),
}

/// A chunk of captured mono samples.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Entry point for acquiring the microphone.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    /// Request microphone access. Fails when the device is denied or missing;
    /// succeeding here is the permission gate for a take.
    async fn open(&self) -> Result<Box<dyn CaptureHandle>, CaptureError>;
}

/// One live capture stream, exclusively owned by the active take.
#[async_trait]
pub trait CaptureHandle: Send {
    /// Begin streaming. Chunks arrive on the returned receiver until `stop`.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioChunk>, CaptureError>;

    /// Stop the stream. Any buffered chunk is flushed into the channel before
    /// it closes; the receiver then yields `None`.
    async fn stop(&mut self) -> Result<(), CaptureError>;
}
