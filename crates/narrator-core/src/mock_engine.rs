//! In-memory speech engine for tests and hosts without a platform engine.
//!
//! Utterances "play" on a simulated clock: each one emits `Started`, then
//! `Ended` once its duration has elapsed outside of pauses. Failures can be
//! scripted by text or by dispatch number.

use crate::engine::{SpeechEngine, Utterance, UtteranceEvent, UtteranceEvents};
use crate::error::{NarratorError, NarratorResult};
use crate::voice_manager::Voice;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

const TICK: Duration = Duration::from_millis(5);

#[derive(Debug, Default)]
struct MockState {
    dispatched: Vec<Utterance>,
    epoch: u64,
    active: bool,
    paused: bool,
    cancel_calls: usize,
    pause_calls: usize,
    resume_calls: usize,
}

/// Scriptable in-memory [`SpeechEngine`]
#[derive(Debug)]
pub struct MockSpeechEngine {
    voices: Vec<Voice>,
    utterance_duration: Duration,
    available: bool,
    fail_containing: Vec<String>,
    fail_on_dispatch: Vec<usize>,
    reject_containing: Vec<String>,
    state: Arc<Mutex<MockState>>,
}

impl MockSpeechEngine {
    /// Create an engine with a small Spanish/English voice list
    #[must_use]
    pub fn new() -> Self {
        Self {
            voices: default_voices(),
            utterance_duration: Duration::from_millis(100),
            available: true,
            fail_containing: Vec::new(),
            fail_on_dispatch: Vec::new(),
            reject_containing: Vec::new(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Replace the offered voices
    #[must_use]
    pub fn with_voices(mut self, voices: Vec<Voice>) -> Self {
        self.voices = voices;
        self
    }

    /// Set how long each utterance plays
    #[must_use]
    pub fn with_utterance_duration(mut self, duration: Duration) -> Self {
        self.utterance_duration = duration;
        self
    }

    /// Report the platform as lacking speech support
    #[must_use]
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Fail mid-utterance when the text contains `needle`
    #[must_use]
    pub fn fail_when_containing(mut self, needle: impl Into<String>) -> Self {
        self.fail_containing.push(needle.into());
        self
    }

    /// Fail mid-utterance on the `n`th dispatch (1-based)
    #[must_use]
    pub fn fail_on_utterance(mut self, n: usize) -> Self {
        self.fail_on_dispatch.push(n);
        self
    }

    /// Refuse to dispatch utterances whose text contains `needle`
    #[must_use]
    pub fn reject_when_containing(mut self, needle: impl Into<String>) -> Self {
        self.reject_containing.push(needle.into());
        self
    }

    /// Every utterance dispatched so far, in order
    #[must_use]
    pub fn dispatched(&self) -> Vec<Utterance> {
        self.state.lock().dispatched.clone()
    }

    /// Texts of every utterance dispatched so far, in order
    #[must_use]
    pub fn dispatched_texts(&self) -> Vec<String> {
        self.state
            .lock()
            .dispatched
            .iter()
            .map(|u| u.text.clone())
            .collect()
    }

    /// Number of `cancel` calls received
    #[must_use]
    pub fn cancel_count(&self) -> usize {
        self.state.lock().cancel_calls
    }

    /// Number of `pause` calls received
    #[must_use]
    pub fn pause_count(&self) -> usize {
        self.state.lock().pause_calls
    }

    /// Number of `resume` calls received
    #[must_use]
    pub fn resume_count(&self) -> usize {
        self.state.lock().resume_calls
    }

    /// Whether playback is currently paused
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    fn should_fail(&self, text: &str, dispatch_number: usize) -> bool {
        self.fail_on_dispatch.contains(&dispatch_number)
            || self.fail_containing.iter().any(|needle| text.contains(needle.as_str()))
    }
}

impl Default for MockSpeechEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechEngine for MockSpeechEngine {
    fn is_available(&self) -> bool {
        self.available
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&self, utterance: Utterance) -> NarratorResult<UtteranceEvents> {
        if !self.available {
            return Err(NarratorError::engine_unavailable("Mock engine disabled"));
        }
        if self
            .reject_containing
            .iter()
            .any(|needle| utterance.text.contains(needle.as_str()))
        {
            return Err(NarratorError::engine(format!(
                "Mock engine rejected '{}'",
                utterance.text
            )));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| NarratorError::engine(format!("No async runtime: {e}")))?;

        let (epoch, fail) = {
            let mut state = self.state.lock();
            state.dispatched.push(utterance.clone());
            state.active = true;
            let fail = self.should_fail(&utterance.text, state.dispatched.len());
            (state.epoch, fail)
        };

        debug!("Mock speaking '{}' (fail: {})", utterance.text, fail);

        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::clone(&self.state);
        let duration = if fail {
            self.utterance_duration / 2
        } else {
            self.utterance_duration
        };

        runtime.spawn(async move {
            let _ = tx.send(UtteranceEvent::Started);

            let mut elapsed = Duration::ZERO;
            while elapsed < duration {
                tokio::time::sleep(TICK).await;
                let state = state.lock();
                if state.epoch != epoch {
                    let _ = tx.send(UtteranceEvent::Error("interrupted".to_string()));
                    return;
                }
                if !state.paused {
                    elapsed += TICK;
                }
            }

            {
                let mut state = state.lock();
                if state.epoch != epoch {
                    let _ = tx.send(UtteranceEvent::Error("interrupted".to_string()));
                    return;
                }
                state.active = false;
            }

            let event = if fail {
                UtteranceEvent::Error("synthesis-failed".to_string())
            } else {
                UtteranceEvent::Ended
            };
            let _ = tx.send(event);
        });

        Ok(rx)
    }

    fn cancel(&self) {
        let mut state = self.state.lock();
        state.epoch += 1;
        state.active = false;
        state.paused = false;
        state.cancel_calls += 1;
        info!("Mock engine cancelled");
    }

    fn pause(&self) {
        let mut state = self.state.lock();
        state.paused = true;
        state.pause_calls += 1;
    }

    fn resume(&self) {
        let mut state = self.state.lock();
        state.paused = false;
        state.resume_calls += 1;
    }

    fn is_speaking(&self) -> bool {
        self.state.lock().active
    }
}

fn default_voices() -> Vec<Voice> {
    vec![
        Voice::new("Paulina", "es-MX"),
        Voice::new("Juan", "es-MX"),
        Voice::new("Mónica", "es-ES"),
        Voice::new("Jorge", "es-ES"),
        Voice::new("Samantha", "en-US"),
        Voice::new("Alex", "en-US"),
        Voice::new("Google UK English Female", "en-GB").remote(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(mut events: UtteranceEvents) -> Vec<UtteranceEvent> {
        let mut seen = Vec::new();
        while let Some(event) = events.recv().await {
            let terminal = event.is_terminal();
            seen.push(event);
            if terminal {
                break;
            }
        }
        seen
    }

    #[tokio::test(start_paused = true)]
    async fn test_utterance_lifecycle() {
        let engine = MockSpeechEngine::new();
        let events = engine
            .speak(Utterance::new("Hola.", "es-MX"))
            .expect("Should dispatch");
        assert!(engine.is_speaking());

        let seen = collect(events).await;
        assert_eq!(seen, vec![UtteranceEvent::Started, UtteranceEvent::Ended]);
        assert!(!engine.is_speaking());
        assert_eq!(engine.dispatched_texts(), vec!["Hola."]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scripted_failures() {
        let engine = MockSpeechEngine::new()
            .fail_when_containing("roto")
            .fail_on_utterance(3);

        for (text, should_fail) in [("Bien.", false), ("Algo roto.", true), ("Tercero.", true)] {
            let events = engine
                .speak(Utterance::new(text, "es-MX"))
                .expect("Should dispatch");
            let last = collect(events).await.pop().expect("Should get events");
            assert_eq!(matches!(last, UtteranceEvent::Error(_)), should_fail, "{text}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection() {
        let engine = MockSpeechEngine::new().reject_when_containing("no");
        let result = engine.speak(Utterance::new("no way", "en-US"));
        assert!(matches!(result, Err(NarratorError::EngineError { .. })));
        assert!(engine.dispatched().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts() {
        let engine = MockSpeechEngine::new().with_utterance_duration(Duration::from_secs(5));
        let events = engine
            .speak(Utterance::new("Largo.", "es-MX"))
            .expect("Should dispatch");
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.cancel();

        let seen = collect(events).await;
        assert_eq!(
            seen.last(),
            Some(&UtteranceEvent::Error("interrupted".to_string()))
        );
        assert_eq!(engine.cancel_count(), 1);
        assert!(!engine.is_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_the_clock() {
        let engine = MockSpeechEngine::new().with_utterance_duration(Duration::from_millis(100));
        let mut events = engine
            .speak(Utterance::new("Pausa.", "es-MX"))
            .expect("Should dispatch");
        assert_eq!(events.recv().await, Some(UtteranceEvent::Started));

        engine.pause();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(engine.is_speaking());
        assert!(events.try_recv().is_err());

        engine.resume();
        assert_eq!(events.recv().await, Some(UtteranceEvent::Ended));
        assert_eq!(engine.pause_count(), 1);
        assert_eq!(engine.resume_count(), 1);
    }

    #[test]
    fn test_unavailable_engine() {
        let engine = MockSpeechEngine::new().unavailable();
        assert!(!engine.is_available());
        let result = engine.speak(Utterance::new("Hola.", "es-MX"));
        assert!(matches!(result, Err(NarratorError::EngineUnavailable { .. })));
    }

    #[test]
    fn test_speak_without_runtime() {
        let engine = MockSpeechEngine::new();
        let result = engine.speak(Utterance::new("Hola.", "es-MX"));
        assert!(matches!(result, Err(NarratorError::EngineError { .. })));
    }
}
