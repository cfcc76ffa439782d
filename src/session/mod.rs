pub mod config;
pub mod machine;
pub mod status;

pub use config::{
    Clip, ConfigError, Genre, Meter, MrType, TakeConfig, DEFAULT_MAX_DURATION, MAX_TEMPO_BPM,
    MIN_TEMPO_BPM,
};
pub use machine::{RecordingSession, TakeError};
pub use status::{CompletedTake, TakePhase, TakeStatus, TakeStatusHandle};
