//! In-memory WAV assembly for the finished take.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use thiserror::Error;

use super::capture::AudioChunk;

#[derive(Debug, Error)]
pub enum WavError {
    #[error("no audio captured")]
    Empty,
    #[error("wav encoding failed: {0}")]
    Encode(String),
}

/// Concatenate captured chunks into a single 16-bit mono WAV.
///
/// The sample rate of the first chunk wins; capture produces a single stream,
/// so mixed rates do not occur in practice.
pub fn encode_wav(chunks: &[AudioChunk]) -> Result<Vec<u8>, WavError> {
    let sample_rate = chunks
        .iter()
        .find(|c| !c.samples.is_empty())
        .map(|c| c.sample_rate)
        .ok_or(WavError::Empty)?;

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            WavWriter::new(&mut cursor, spec).map_err(|e| WavError::Encode(e.to_string()))?;
        for chunk in chunks {
            for &sample in &chunk.samples {
                let clamped = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                writer
                    .write_sample(clamped)
                    .map_err(|e| WavError::Encode(e.to_string()))?;
            }
        }
        writer
            .finalize()
            .map_err(|e| WavError::Encode(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
