//! The platform speech engine capability consumed by the speech manager.
//!
//! Platform engines report utterance progress asynchronously. Here each
//! dispatched [`Utterance`] hands back its own event channel, so the manager
//! can await the end of a sentence instead of registering callbacks.

use crate::error::NarratorResult;
use crate::voice_manager::Voice;
use tokio::sync::mpsc;

/// Notifications delivered for a single utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceEvent {
    /// Audio for the utterance started playing
    Started,
    /// The utterance finished playing
    Ended,
    /// The engine gave up on the utterance
    Error(String),
}

impl UtteranceEvent {
    /// Whether no further events follow this one
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended | Self::Error(_))
    }
}

/// Event stream for one dispatched utterance
pub type UtteranceEvents = mpsc::UnboundedReceiver<UtteranceEvent>;

/// One unit of text submitted to the engine, always a single sentence here
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    /// Text to synthesize
    pub text: String,
    /// Voice to use, `None` for the engine default
    pub voice: Option<Voice>,
    /// Language tag
    pub lang: String,
    /// Rate multiplier
    pub rate: f32,
    /// Pitch
    pub pitch: f32,
    /// Volume (0.0 to 1.0)
    pub volume: f32,
}

impl Utterance {
    /// Create an utterance with engine defaults for rate, pitch and volume
    #[must_use]
    pub fn new(text: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: None,
            lang: lang.into(),
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

/// A text-to-speech engine that plays one utterance at a time.
///
/// The speech manager is the engine's only client and never dispatches a new
/// utterance before the previous one reported a terminal event or was
/// cancelled. Implementations must not block in any of these methods, and
/// `speak` must not call back into the manager: it runs under the manager's
/// session lock.
pub trait SpeechEngine: Send + Sync + std::fmt::Debug {
    /// Whether the platform supports speech synthesis at all
    fn is_available(&self) -> bool {
        true
    }

    /// Voices currently offered by the platform; the list may change over time
    fn voices(&self) -> Vec<Voice>;

    /// Queue an utterance for playback and return its event stream
    ///
    /// # Errors
    ///
    /// Returns an error if the engine refuses the utterance outright
    fn speak(&self, utterance: Utterance) -> NarratorResult<UtteranceEvents>;

    /// Drop the active utterance and anything queued behind it
    fn cancel(&self);

    /// Pause the active utterance
    fn pause(&self);

    /// Resume a paused utterance
    fn resume(&self);

    /// Whether an utterance is currently active
    fn is_speaking(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_events() {
        assert!(!UtteranceEvent::Started.is_terminal());
        assert!(UtteranceEvent::Ended.is_terminal());
        assert!(UtteranceEvent::Error("interrupted".to_string()).is_terminal());
    }

    #[test]
    fn test_utterance_defaults() {
        let utterance = Utterance::new("Hola.", "es-MX");
        assert_eq!(utterance.text, "Hola.");
        assert_eq!(utterance.lang, "es-MX");
        assert_eq!(utterance.voice, None);
        assert_eq!(utterance.rate, 1.0);
        assert_eq!(utterance.pitch, 1.0);
        assert_eq!(utterance.volume, 1.0);
    }
}
