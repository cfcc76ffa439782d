pub mod capture;
pub mod mic;
pub mod playback;
pub mod wav;

pub use capture::{AudioChunk, CaptureError, CaptureHandle, CaptureSource};
pub use mic::MicCaptureSource;
pub use playback::{ClipPlayer, PlaybackError, RodioPlayer};
pub use wav::{encode_wav, WavError};
