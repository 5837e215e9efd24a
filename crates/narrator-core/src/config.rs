//! Speech configuration: rate, pitch, volume, voice preferences and timing.
//!
//! Configuration can be built in code with the `with_*` setters, which
//! validate their ranges, or loaded from TOML:
//!
//! ```toml
//! speech_speed = 1.1
//! volume = 0.8
//! pitch = 1.0
//! voice_gender = "female"
//! language = "es"
//!
//! [timing]
//! debounce_ms = 200
//! sentence_gap_ms = 400
//! ```

use crate::error::{NarratorError, NarratorResult};
use crate::voice_manager::VoiceGender;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Active UI language, drives the locale preference order of voice selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Spanish
    #[default]
    Es,
    /// English
    En,
}

impl Language {
    /// Base language code (`es` or `en`)
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::En => "en",
        }
    }

    /// Tag handed to the engine when no voice could be resolved
    #[must_use]
    pub const fn default_tag(self) -> &'static str {
        match self {
            Self::Es => "es-ES",
            Self::En => "en-US",
        }
    }

    /// Regional variants tried in order before falling back to the base code
    #[must_use]
    pub const fn locale_preferences(self) -> &'static [&'static str] {
        match self {
            Self::Es => &["es-MX", "es-US", "es-419", "es-ES", "es-AR", "es-CO"],
            Self::En => &["en-US", "en-GB", "en-CA", "en-AU", "en-IN"],
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Debounce and inter-sentence pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechTiming {
    /// Quiet window before a `speak` request starts playback
    pub debounce_ms: u64,
    /// Pause inserted between consecutive sentences
    pub sentence_gap_ms: u64,
}

impl SpeechTiming {
    /// Debounce window as a [`Duration`]
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Inter-sentence pause as a [`Duration`]
    #[must_use]
    pub const fn sentence_gap(&self) -> Duration {
        Duration::from_millis(self.sentence_gap_ms)
    }
}

impl Default for SpeechTiming {
    fn default() -> Self {
        Self {
            debounce_ms: crate::DEFAULT_DEBOUNCE_MS,
            sentence_gap_ms: crate::DEFAULT_SENTENCE_GAP_MS,
        }
    }
}

/// Configuration applied to every utterance of a speech session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Rate multiplier (1.0 = normal speed)
    pub speech_speed: f32,
    /// Output volume (0.0 to 1.0)
    pub volume: f32,
    /// Pitch (1.0 = engine default)
    pub pitch: f32,
    /// Preferred voice gender
    pub voice_gender: VoiceGender,
    /// Exact voice name to use when the engine offers it
    pub selected_voice_name: Option<String>,
    /// Active UI language
    pub language: Language,
    /// Debounce and pacing
    pub timing: SpeechTiming,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            speech_speed: 1.0,
            volume: 1.0,
            pitch: 1.0,
            voice_gender: VoiceGender::Auto,
            selected_voice_name: None,
            language: Language::Es,
            timing: SpeechTiming::default(),
        }
    }
}

impl SpeechConfig {
    /// Parse and validate a configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a value is out of range
    pub fn from_toml_str(source: &str) -> NarratorResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its contents are invalid
    pub fn from_file(path: impl AsRef<Path>) -> NarratorResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            NarratorError::file(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&source)?;
        info!("Loaded speech configuration from {}", path.display());
        Ok(config)
    }

    /// Set the rate multiplier
    ///
    /// # Errors
    ///
    /// Returns an error if speed is not in the valid range (0.1 to 10.0)
    pub fn with_speech_speed(mut self, speed: f32) -> NarratorResult<Self> {
        check_range("Speech speed", speed, 0.1, 10.0)?;
        self.speech_speed = speed;
        Ok(self)
    }

    /// Set the output volume
    ///
    /// # Errors
    ///
    /// Returns an error if volume is not in the valid range (0.0 to 1.0)
    pub fn with_volume(mut self, volume: f32) -> NarratorResult<Self> {
        check_range("Volume", volume, 0.0, 1.0)?;
        self.volume = volume;
        Ok(self)
    }

    /// Set the pitch
    ///
    /// # Errors
    ///
    /// Returns an error if pitch is not in the valid range (0.0 to 2.0)
    pub fn with_pitch(mut self, pitch: f32) -> NarratorResult<Self> {
        check_range("Pitch", pitch, 0.0, 2.0)?;
        self.pitch = pitch;
        Ok(self)
    }

    /// Set the preferred voice gender
    #[must_use]
    pub fn with_voice_gender(mut self, gender: VoiceGender) -> Self {
        self.voice_gender = gender;
        self
    }

    /// Pin a voice by exact name
    #[must_use]
    pub fn with_selected_voice(mut self, name: impl Into<String>) -> Self {
        self.selected_voice_name = Some(name.into());
        self
    }

    /// Set the active language
    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Override debounce and pacing
    #[must_use]
    pub fn with_timing(mut self, timing: SpeechTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Validate configuration ranges
    ///
    /// # Errors
    ///
    /// Returns an error naming the first value that is out of range
    pub fn validate(&self) -> NarratorResult<()> {
        check_range("Speech speed", self.speech_speed, 0.1, 10.0)?;
        check_range("Volume", self.volume, 0.0, 1.0)?;
        check_range("Pitch", self.pitch, 0.0, 2.0)?;

        if matches!(&self.selected_voice_name, Some(name) if name.trim().is_empty()) {
            return Err(NarratorError::configuration(
                "Selected voice name cannot be empty",
            ));
        }

        Ok(())
    }
}

fn check_range(what: &str, value: f32, min: f32, max: f32) -> NarratorResult<()> {
    if !(min..=max).contains(&value) {
        return Err(NarratorError::configuration(format!(
            "{what} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}
