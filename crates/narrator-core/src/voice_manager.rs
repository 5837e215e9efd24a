//! Voice description and per-sentence voice selection.

use crate::config::{Language, SpeechConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Preferred voice gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    /// Female voice
    Female,
    /// Male voice
    Male,
    /// No preference, pick the best local voice
    #[default]
    Auto,
}

impl std::fmt::Display for VoiceGender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Female => write!(f, "female"),
            Self::Male => write!(f, "male"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

impl VoiceGender {
    /// Lowercase name fragments that identify voices of this gender
    #[must_use]
    pub const fn name_patterns(self) -> &'static [&'static str] {
        match self {
            Self::Female => &[
                "female", "woman", "mujer", "paulina", "monica", "mónica", "lucia", "lucía",
                "helena", "laura", "sabina", "elvira", "dalia", "marisol", "esperanza",
                "soledad", "conchita", "penelope", "samantha", "victoria", "karen", "moira",
                "tessa", "fiona", "susan", "zira", "hazel", "aria", "jenny", "allison", "ava",
            ],
            Self::Male => &[
                "male", "man", "hombre", "jorge", "juan", "diego", "carlos", "pablo", "raul",
                "raúl", "alvaro", "álvaro", "enrique", "miguel", "andres", "andrés", "daniel",
                "alex", "fred", "david", "mark", "george", "guy", "tom", "aaron", "oliver",
            ],
            Self::Auto => &[],
        }
    }

    /// Check whether a voice name carries one of this gender's patterns
    #[must_use]
    pub fn matches_name(self, name: &str) -> bool {
        let patterns = self.name_patterns();
        name.split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(str::to_lowercase)
            .any(|word| patterns.contains(&word.as_str()))
    }
}

/// A voice offered by the speech engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Voice {
    /// Human-readable name, unique within an engine
    pub name: String,
    /// BCP-47 language tag (e.g., "es-MX", "en_US")
    pub lang: String,
    /// Whether synthesis runs on the device rather than a remote service
    pub local_service: bool,
}

impl Voice {
    /// Create a new local voice
    #[must_use]
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
            local_service: true,
        }
    }

    /// Mark the voice as remote (network synthesized)
    #[must_use]
    pub fn remote(mut self) -> Self {
        self.local_service = false;
        self
    }

    /// Language tag lowercased with `_` normalized to `-`
    #[must_use]
    pub fn normalized_lang(&self) -> String {
        self.lang.replace('_', "-").to_lowercase()
    }

    /// Check if the voice's language tag equals `tag` after normalization
    #[must_use]
    pub fn has_locale(&self, tag: &str) -> bool {
        self.normalized_lang() == tag.replace('_', "-").to_lowercase()
    }

    /// Check if the voice's language tag starts with the given base code
    #[must_use]
    pub fn supports_language(&self, code: &str) -> bool {
        self.normalized_lang()
            .split('-')
            .next()
            .is_some_and(|base| base.eq_ignore_ascii_case(code))
    }
}

/// Resolves which engine voice speaks a sentence
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSelector {
    selected_voice_name: Option<String>,
    gender: VoiceGender,
    language: Language,
}

impl VoiceSelector {
    /// Create a selector from explicit preferences
    #[must_use]
    pub const fn new(
        selected_voice_name: Option<String>,
        gender: VoiceGender,
        language: Language,
    ) -> Self {
        Self {
            selected_voice_name,
            gender,
            language,
        }
    }

    /// Create a selector from a speech configuration
    #[must_use]
    pub fn from_config(config: &SpeechConfig) -> Self {
        Self::new(
            config.selected_voice_name.clone(),
            config.voice_gender,
            config.language,
        )
    }

    /// Pick a voice from the engine's current list.
    ///
    /// An exact name match wins. Otherwise the candidates are the voices of the
    /// first preferred locale that has any, then any voice of the base
    /// language, narrowed by gender and by local synthesis. Returns `None`
    /// when no voice speaks the language.
    #[must_use]
    pub fn select(&self, voices: &[Voice]) -> Option<Voice> {
        if let Some(name) = &self.selected_voice_name {
            if let Some(voice) = voices.iter().find(|v| &v.name == name) {
                debug!("Using selected voice '{}'", voice.name);
                return Some(voice.clone());
            }
            debug!("Selected voice '{}' not offered by engine", name);
        }

        let candidates = self.language_candidates(voices);
        let chosen = match self.gender {
            VoiceGender::Auto => prefer_local(&candidates),
            gender => {
                let matching: Vec<&Voice> = candidates
                    .iter()
                    .copied()
                    .filter(|v| gender.matches_name(&v.name))
                    .collect();
                prefer_local(&matching).or_else(|| candidates.first().copied())
            }
        };

        if let Some(voice) = chosen {
            debug!(
                "Resolved voice '{}' ({}) for {} / {}",
                voice.name, voice.lang, self.language, self.gender
            );
        }
        chosen.cloned()
    }

    fn language_candidates<'a>(&self, voices: &'a [Voice]) -> Vec<&'a Voice> {
        for tag in self.language.locale_preferences() {
            let regional: Vec<&Voice> = voices.iter().filter(|v| v.has_locale(tag)).collect();
            if !regional.is_empty() {
                return regional;
            }
        }

        voices
            .iter()
            .filter(|v| v.supports_language(self.language.code()))
            .collect()
    }
}

fn prefer_local<'a>(voices: &[&'a Voice]) -> Option<&'a Voice> {
    voices
        .iter()
        .find(|v| v.local_service)
        .or_else(|| voices.first())
        .copied()
}
