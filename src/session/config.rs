//! Per-take configuration: tempo, meter, and the derived count-in/click timing.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Tempo bounds accepted from the config file, CLI, and API.
pub const MIN_TEMPO_BPM: u32 = 40;
pub const MAX_TEMPO_BPM: u32 = 220;

/// Default forced-stop bound for a take.
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(60);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tempo {0} bpm is outside the supported range {MIN_TEMPO_BPM}-{MAX_TEMPO_BPM}")]
    TempoOutOfRange(u32),
    #[error("unknown meter '{0}'")]
    UnknownMeter(String),
    #[error("unknown genre '{0}'")]
    UnknownGenre(String),
    #[error("unknown MR type '{0}'")]
    UnknownMrType(String),
    #[error("max duration must be greater than zero")]
    ZeroDuration,
}

/// Time signature labels offered by the recording form.
///
/// Each meter maps to the number of count-in beats played before recording
/// starts. Compound meters count their dotted-note pulses, not their notated
/// numerator (6/8 is felt in two, 12/8 in four).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Meter {
    #[serde(rename = "2/4")]
    TwoFour,
    #[serde(rename = "3/4")]
    ThreeFour,
    #[serde(rename = "4/4")]
    FourFour,
    #[serde(rename = "5/4")]
    FiveFour,
    #[serde(rename = "6/8")]
    SixEight,
    #[serde(rename = "7/4")]
    SevenFour,
    #[serde(rename = "7/8")]
    SevenEight,
    #[serde(rename = "9/4")]
    NineFour,
    #[serde(rename = "9/8")]
    NineEight,
    #[serde(rename = "12/8")]
    TwelveEight,
}

impl Meter {
    pub const ALL: [Meter; 10] = [
        Meter::TwoFour,
        Meter::ThreeFour,
        Meter::FourFour,
        Meter::FiveFour,
        Meter::SixEight,
        Meter::SevenFour,
        Meter::SevenEight,
        Meter::NineFour,
        Meter::NineEight,
        Meter::TwelveEight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Meter::TwoFour => "2/4",
            Meter::ThreeFour => "3/4",
            Meter::FourFour => "4/4",
            Meter::FiveFour => "5/4",
            Meter::SixEight => "6/8",
            Meter::SevenFour => "7/4",
            Meter::SevenEight => "7/8",
            Meter::NineFour => "9/4",
            Meter::NineEight => "9/8",
            Meter::TwelveEight => "12/8",
        }
    }

    pub fn from_label(label: &str) -> Result<Self, ConfigError> {
        match label {
            "2/4" => Ok(Meter::TwoFour),
            "3/4" => Ok(Meter::ThreeFour),
            "4/4" => Ok(Meter::FourFour),
            "5/4" => Ok(Meter::FiveFour),
            "6/8" => Ok(Meter::SixEight),
            "7/4" => Ok(Meter::SevenFour),
            "7/8" => Ok(Meter::SevenEight),
            "9/4" => Ok(Meter::NineFour),
            "9/8" => Ok(Meter::NineEight),
            "12/8" => Ok(Meter::TwelveEight),
            other => Err(ConfigError::UnknownMeter(other.to_string())),
        }
    }

    /// Count-in beats for this meter.
    pub fn beats_per_measure(&self) -> u8 {
        match self {
            Meter::TwoFour => 2,
            Meter::ThreeFour => 3,
            Meter::FourFour => 4,
            Meter::FiveFour => 5,
            Meter::SixEight => 2,
            Meter::SevenFour => 4,
            Meter::SevenEight => 4,
            Meter::NineFour => 3,
            Meter::NineEight => 3,
            Meter::TwelveEight => 4,
        }
    }
}

impl Default for Meter {
    fn default() -> Self {
        Meter::FourFour
    }
}

/// Genre tag attached to a take. Collected and echoed in status; the
/// sequencing logic does not branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    Rock,
    Jazz,
    Funk,
    Hiphop,
    Ballad,
}

impl Genre {
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Rock => "rock",
            Genre::Jazz => "jazz",
            Genre::Funk => "funk",
            Genre::Hiphop => "hiphop",
            Genre::Ballad => "ballad",
        }
    }

    pub fn from_label(label: &str) -> Result<Self, ConfigError> {
        match label {
            "rock" => Ok(Genre::Rock),
            "jazz" => Ok(Genre::Jazz),
            "funk" => Ok(Genre::Funk),
            "hiphop" => Ok(Genre::Hiphop),
            "ballad" => Ok(Genre::Ballad),
            other => Err(ConfigError::UnknownGenre(other.to_string())),
        }
    }
}

/// Accompaniment selection. Only `Metronome` has a local realization today;
/// the other variants are accepted and echoed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MrType {
    Metronome,
    Backing,
    Upload,
}

impl MrType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MrType::Metronome => "metronome",
            MrType::Backing => "backing",
            MrType::Upload => "upload",
        }
    }

    pub fn from_label(label: &str) -> Result<Self, ConfigError> {
        match label {
            "metronome" => Ok(MrType::Metronome),
            "backing" => Ok(MrType::Backing),
            "upload" => Ok(MrType::Upload),
            other => Err(ConfigError::UnknownMrType(other.to_string())),
        }
    }
}

impl Default for MrType {
    fn default() -> Self {
        MrType::Metronome
    }
}

/// A short clip the player knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clip {
    /// Spoken/pitched count beat, 1-based within the measure.
    Count(u8),
    /// Metronome click.
    Click,
}

/// Immutable configuration for one recording take.
#[derive(Debug, Clone, PartialEq)]
pub struct TakeConfig {
    pub tempo_bpm: u32,
    pub meter: Meter,
    pub genre: Option<Genre>,
    pub slow_mode: bool,
    pub mr_type: MrType,
    pub max_duration: Duration,
}

impl TakeConfig {
    /// Validate field ranges and build the config.
    pub fn new(
        tempo_bpm: u32,
        meter: Meter,
        genre: Option<Genre>,
        slow_mode: bool,
        mr_type: MrType,
        max_duration: Duration,
    ) -> Result<Self, ConfigError> {
        if !(MIN_TEMPO_BPM..=MAX_TEMPO_BPM).contains(&tempo_bpm) {
            return Err(ConfigError::TempoOutOfRange(tempo_bpm));
        }
        if max_duration.is_zero() {
            return Err(ConfigError::ZeroDuration);
        }
        Ok(Self {
            tempo_bpm,
            meter,
            genre,
            slow_mode,
            mr_type,
            max_duration,
        })
    }

    /// One beat at the configured tempo.
    pub fn beat_interval(&self) -> Duration {
        Duration::from_millis(60_000 / u64::from(self.tempo_bpm))
    }

    /// The ordered count-in clips, one per beat of the measure.
    pub fn count_in(&self) -> Vec<Clip> {
        (1..=self.meter.beats_per_measure()).map(Clip::Count).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meter_beat_counts_match_the_form_table() {
        let expected = [
            (Meter::FourFour, 4),
            (Meter::ThreeFour, 3),
            (Meter::SixEight, 2),
            (Meter::TwelveEight, 4),
            (Meter::FiveFour, 5),
            (Meter::SevenEight, 4),
            (Meter::NineEight, 3),
            (Meter::TwoFour, 2),
            (Meter::SevenFour, 4),
            (Meter::NineFour, 3),
        ];
        for (meter, beats) in expected {
            assert_eq!(meter.beats_per_measure(), beats, "{}", meter.as_str());
        }
    }

    #[test]
    fn meter_labels_round_trip() {
        for meter in Meter::ALL {
            assert_eq!(Meter::from_label(meter.as_str()), Ok(meter));
        }
        assert!(matches!(
            Meter::from_label("13/8"),
            Err(ConfigError::UnknownMeter(_))
        ));
    }

    #[test]
    fn beat_interval_at_120_bpm_is_500ms() {
        let config = TakeConfig::new(
            120,
            Meter::FourFour,
            None,
            false,
            MrType::Metronome,
            DEFAULT_MAX_DURATION,
        )
        .unwrap();
        assert_eq!(config.beat_interval(), Duration::from_millis(500));
    }

    #[test]
    fn count_in_is_one_clip_per_beat_in_order() {
        let config = TakeConfig::new(
            90,
            Meter::FiveFour,
            Some(Genre::Funk),
            false,
            MrType::Metronome,
            DEFAULT_MAX_DURATION,
        )
        .unwrap();
        let clips = config.count_in();
        assert_eq!(
            clips,
            vec![
                Clip::Count(1),
                Clip::Count(2),
                Clip::Count(3),
                Clip::Count(4),
                Clip::Count(5)
            ]
        );
    }

    #[test]
    fn tempo_outside_slider_range_is_rejected() {
        for bpm in [0, 39, 221] {
            assert_eq!(
                TakeConfig::new(
                    bpm,
                    Meter::FourFour,
                    None,
                    false,
                    MrType::Metronome,
                    DEFAULT_MAX_DURATION
                )
                .unwrap_err(),
                ConfigError::TempoOutOfRange(bpm)
            );
        }
    }
}
