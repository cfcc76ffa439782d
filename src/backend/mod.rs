//! HTTP client for the beat-transcription backend.
//!
//! Two calls per take: a multipart WAV upload that yields a stored filename,
//! then a transcription request for that filename. Neither call retries; any
//! failure ends the cycle.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("upload response did not include a filename")]
    MissingFilename,
    #[error("transcription request failed: {0}")]
    Transcription(String),
}

/// One detected onset, quantized to the beat grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatNote {
    pub quantized_time: f64,
    pub raw_time: f64,
}

/// Transcription of an uploaded take.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatTranscription {
    pub tempo: f64,
    pub beats: u32,
    pub notes: Vec<BeatNote>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    filename: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// The remote collaborator a finished take is handed to.
#[async_trait]
pub trait BeatBackend: Send + Sync {
    /// Upload the WAV artifact; returns the identifier the backend stored it
    /// under.
    async fn upload(&self, wav: Vec<u8>, file_name: &str) -> Result<String, BackendError>;

    /// Request transcription of a previously uploaded artifact.
    async fn transcribe(&self, filename: &str) -> Result<BeatTranscription, BackendError>;
}

pub struct HttpBeatBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBeatBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BeatBackend for HttpBeatBackend {
    async fn upload(&self, wav: Vec<u8>, file_name: &str) -> Result<String, BackendError> {
        let url = format!("{}/upload-wav/", self.base_url);
        debug!("Uploading {} byte take to {}", wav.len(), url);

        let form = Form::new().part(
            "file",
            Part::bytes(wav)
                .file_name(file_name.to_string())
                .mime_str("audio/wav")
                .map_err(|e| BackendError::Upload(e.to_string()))?,
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::Upload(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Upload(e.to_string()))?;

        if !status.is_success() {
            error!("Upload failed with status {}: {}", status, body);
            return Err(BackendError::Upload(format!("status {}: {}", status, body)));
        }

        let filename = parse_upload_body(&body)?;
        info!("Take uploaded as {}", filename);
        Ok(filename)
    }

    async fn transcribe(&self, filename: &str) -> Result<BeatTranscription, BackendError> {
        let url = format!("{}/transcribe-beat/", self.base_url);
        debug!("Requesting transcription of {} from {}", filename, url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "filename": filename }))
            .send()
            .await
            .map_err(|e| BackendError::Transcription(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Transcription(e.to_string()))?;

        if !status.is_success() {
            error!("Transcription failed with status {}: {}", status, body);
            return Err(BackendError::Transcription(format!(
                "status {}: {}",
                status, body
            )));
        }

        let transcription = parse_transcription_body(&body)?;
        info!(
            "Transcription complete: {} beats, {} notes",
            transcription.beats,
            transcription.notes.len()
        );
        Ok(transcription)
    }
}

fn parse_upload_body(body: &str) -> Result<String, BackendError> {
    let parsed: UploadResponse = serde_json::from_str(body)
        .map_err(|e| BackendError::Upload(format!("unparseable response: {}", e)))?;
    match parsed.filename {
        Some(filename) if !filename.is_empty() => Ok(filename),
        _ => Err(BackendError::MissingFilename),
    }
}

fn parse_transcription_body(body: &str) -> Result<BeatTranscription, BackendError> {
    // The backend reports some failures as an error object under a 200.
    if let Ok(err) = serde_json::from_str::<ErrorBody>(body) {
        return Err(BackendError::Transcription(err.error));
    }
    serde_json::from_str(body)
        .map_err(|e| BackendError::Transcription(format!("unparseable response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_body_with_filename_parses() {
        let body = r#"{"message": "stored", "filename": "rec123.wav", "url": "https://x/rec123.wav"}"#;
        assert_eq!(parse_upload_body(body).unwrap(), "rec123.wav");
    }

    #[test]
    fn upload_body_without_filename_is_missing_identifier() {
        for body in [r#"{"message": "stored"}"#, r#"{"filename": ""}"#] {
            assert!(matches!(
                parse_upload_body(body),
                Err(BackendError::MissingFilename)
            ));
        }
    }

    #[test]
    fn transcription_body_parses_notes() {
        let body = r#"{
            "tempo": 119.7,
            "beats": 8,
            "notes": [{"quantized_time": 0.5, "raw_time": 0.492}]
        }"#;
        let result = parse_transcription_body(body).unwrap();
        assert_eq!(result.beats, 8);
        assert_eq!(result.notes.len(), 1);
        assert!((result.notes[0].quantized_time - 0.5).abs() < 1e-9);
    }

    #[test]
    fn transcription_error_body_is_surfaced() {
        let err = parse_transcription_body(r#"{"error": "file not found"}"#).unwrap_err();
        assert!(matches!(err, BackendError::Transcription(msg) if msg == "file not found"));
    }
}
