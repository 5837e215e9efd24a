//! Sequenced speech playback on top of a [`SpeechEngine`].
//!
//! A [`SpeechManager`] turns a block of text into one utterance per sentence
//! and plays them strictly in order, one at a time. Every `speak` starts a new
//! session and supersedes the previous one: its pending debounce timer and
//! playback task are aborted, the engine is cancelled and none of its
//! callbacks fire afterwards.
//!
//! Sessions are tagged with an epoch. Anything that invalidates a session
//! (`speak`, `stop`) bumps the epoch under the status lock, and the playback
//! task re-checks its epoch before every side effect. Dispatching a sentence
//! happens under that same lock, and hooks run under a delivery guard that
//! `speak` and `stop` also take, so once either returns the superseded
//! session neither reaches the engine nor calls back.

use crate::config::SpeechConfig;
use crate::engine::{SpeechEngine, Utterance, UtteranceEvent, UtteranceEvents};
use crate::error::NarratorResult;
use crate::text::{clean_text, split_sentences};
use crate::voice_manager::VoiceSelector;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Playback state of the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Nothing is being spoken
    #[default]
    Idle,
    /// A session is playing
    Speaking,
    /// A session is paused mid-way
    Paused,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Speaking => write!(f, "Speaking"),
            Self::Paused => write!(f, "Paused"),
        }
    }
}

/// Snapshot of the observable session state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpeechStatus {
    /// Current playback state
    pub state: PlaybackState,
    /// Cleaned text of the active session, empty when idle
    pub current_text: String,
    /// Index of the sentence being spoken
    pub current_sentence_index: usize,
    /// Number of sentences in the active session
    pub total_sentences: usize,
}

type Hook = Arc<dyn Fn() + Send + Sync>;
type ProgressHook = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Hooks invoked as a session progresses
#[derive(Clone, Default)]
pub struct SpeechCallbacks {
    on_start: Option<Hook>,
    on_end: Option<Hook>,
    on_progress: Option<ProgressHook>,
}

impl SpeechCallbacks {
    /// Create an empty set of callbacks
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once per session when the first sentence starts playing
    #[must_use]
    pub fn on_start(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_start = Some(Arc::new(hook));
        self
    }

    /// Called once per session after the last sentence
    #[must_use]
    pub fn on_end(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_end = Some(Arc::new(hook));
        self
    }

    /// Called with `(sentence_index, total_sentences)` as each sentence starts
    #[must_use]
    pub fn on_progress(mut self, hook: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(hook));
        self
    }

    fn start(&self) {
        if let Some(hook) = &self.on_start {
            hook();
        }
    }

    fn end(&self) {
        if let Some(hook) = &self.on_end {
            hook();
        }
    }

    fn progress(&self, index: usize, total: usize) {
        if let Some(hook) = &self.on_progress {
            hook(index, total);
        }
    }
}

impl std::fmt::Debug for SpeechCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechCallbacks")
            .field("on_start", &self.on_start.is_some())
            .field("on_end", &self.on_end.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
struct Session {
    epoch: u64,
    status: SpeechStatus,
}

enum SentenceOutcome {
    Completed,
    Failed(String),
    Superseded,
}

#[derive(Debug)]
struct Inner {
    engine: Arc<dyn SpeechEngine>,
    config: RwLock<SpeechConfig>,
    callbacks: RwLock<SpeechCallbacks>,
    // Held while a hook runs; reentrant so hooks may call `speak` or `stop`.
    delivery: ReentrantMutex<()>,
    session: Mutex<Session>,
    // Lock order: `delivery`, then `task`, then `session`.
    task: Mutex<Option<JoinHandle<()>>>,
    paused: watch::Sender<bool>,
}

/// Plays text one sentence at a time through an injected speech engine.
///
/// The manager is a cheap handle; clones share the same session. `speak`
/// must be called from within a Tokio runtime, elsewhere it is a no-op.
#[derive(Debug, Clone)]
pub struct SpeechManager {
    inner: Arc<Inner>,
}

impl SpeechManager {
    /// Create a manager with the default configuration
    #[must_use]
    pub fn new(engine: Arc<dyn SpeechEngine>) -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                engine,
                config: RwLock::new(SpeechConfig::default()),
                callbacks: RwLock::new(SpeechCallbacks::default()),
                delivery: ReentrantMutex::new(()),
                session: Mutex::new(Session::default()),
                task: Mutex::new(None),
                paused,
            }),
        }
    }

    /// Create a manager with a custom configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn with_config(engine: Arc<dyn SpeechEngine>, config: SpeechConfig) -> NarratorResult<Self> {
        let manager = Self::new(engine);
        manager.set_config(config)?;
        Ok(manager)
    }

    /// Attach session callbacks
    #[must_use]
    pub fn with_callbacks(self, callbacks: SpeechCallbacks) -> Self {
        self.set_callbacks(callbacks);
        self
    }

    /// Replace the configuration; applies from the next sentence on
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn set_config(&self, config: SpeechConfig) -> NarratorResult<()> {
        config.validate()?;
        debug!("Speech configuration updated: {:?}", config);
        *self.inner.config.write() = config;
        Ok(())
    }

    /// Current configuration
    #[must_use]
    pub fn config(&self) -> SpeechConfig {
        self.inner.config.read().clone()
    }

    /// Replace the session callbacks
    pub fn set_callbacks(&self, callbacks: SpeechCallbacks) {
        *self.inner.callbacks.write() = callbacks;
    }

    /// Speak `text`, superseding whatever is currently playing.
    ///
    /// Text that cleans to nothing is ignored without touching the current
    /// session. Playback starts after the debounce window, so a burst of
    /// calls only speaks the last one. Blocks while a hook of the current
    /// session is running on another thread.
    pub fn speak(&self, text: &str) {
        let cleaned = clean_text(text);
        if cleaned.is_empty() {
            debug!("Ignoring speech request with no speakable text");
            return;
        }
        if !self.inner.engine.is_available() {
            debug!("Speech engine unavailable, ignoring speech request");
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("speak called outside of an async runtime, ignoring");
            return;
        };

        let _delivery = self.inner.delivery.lock();
        let mut task = self.inner.task.lock();
        let epoch = self.inner.supersede(&mut task);
        debug!("Queued speech request (epoch {epoch}, {} chars)", cleaned.len());

        let inner = Arc::clone(&self.inner);
        *task = Some(runtime.spawn(async move {
            let debounce = inner.config.read().timing.debounce();
            tokio::time::sleep(debounce).await;
            inner.run_session(epoch, cleaned).await;
        }));
    }

    /// Stop playback immediately and reset to idle. Safe to call at any time,
    /// including from inside a hook.
    pub fn stop(&self) {
        let _delivery = self.inner.delivery.lock();
        let mut task = self.inner.task.lock();
        let epoch = self.inner.supersede(&mut task);
        debug!("Speech stopped (epoch {epoch})");
    }

    /// Pause the active session; no-op unless speaking
    pub fn pause(&self) {
        {
            let mut session = self.inner.session.lock();
            if session.status.state != PlaybackState::Speaking {
                return;
            }
            session.status.state = PlaybackState::Paused;
        }
        self.inner.paused.send_replace(true);
        self.inner.engine.pause();
        info!("Speech paused");
    }

    /// Resume a paused session; no-op unless paused
    pub fn resume(&self) {
        {
            let mut session = self.inner.session.lock();
            if session.status.state != PlaybackState::Paused {
                return;
            }
            session.status.state = PlaybackState::Speaking;
        }
        self.inner.engine.resume();
        self.inner.paused.send_replace(false);
        info!("Speech resumed");
    }

    /// Consistent snapshot of the observable state
    #[must_use]
    pub fn status(&self) -> SpeechStatus {
        self.inner.session.lock().status.clone()
    }

    /// Current playback state
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.inner.session.lock().status.state
    }

    /// Whether a session is playing
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.state() == PlaybackState::Speaking
    }

    /// Whether a session is paused
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state() == PlaybackState::Paused
    }

    /// Cleaned text of the active session
    #[must_use]
    pub fn current_text(&self) -> String {
        self.inner.session.lock().status.current_text.clone()
    }

    /// Index of the sentence being spoken
    #[must_use]
    pub fn current_sentence_index(&self) -> usize {
        self.inner.session.lock().status.current_sentence_index
    }

    /// Number of sentences in the active session
    #[must_use]
    pub fn total_sentences(&self) -> usize {
        self.inner.session.lock().status.total_sentences
    }
}

impl Inner {
    /// Invalidate the current session and return the new epoch.
    fn supersede(&self, task: &mut Option<JoinHandle<()>>) -> u64 {
        let mut in_flight = false;
        if let Some(handle) = task.take() {
            in_flight = !handle.is_finished();
            handle.abort();
        }

        let (epoch, previous) = {
            let mut session = self.session.lock();
            session.epoch += 1;
            let previous = std::mem::take(&mut session.status);
            (session.epoch, previous.state)
        };
        self.paused.send_replace(false);

        if in_flight || previous != PlaybackState::Idle || self.engine.is_speaking() {
            self.engine.cancel();
        }
        epoch
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.session.lock().epoch == epoch
    }

    async fn run_session(&self, epoch: u64, cleaned: String) {
        if self.engine.is_speaking() {
            debug!("Engine still busy, cancelling before new session");
            self.engine.cancel();
        }

        let sentences = split_sentences(&cleaned);
        let total = sentences.len();
        {
            let mut session = self.session.lock();
            if session.epoch != epoch {
                return;
            }
            session.status.current_text = cleaned;
            session.status.current_sentence_index = 0;
            session.status.total_sentences = total;
        }
        info!("Starting speech session with {total} sentence(s)");

        let gap = self.config.read().timing.sentence_gap();
        let mut started = false;

        for (index, sentence) in sentences.into_iter().enumerate() {
            if !self.wait_until_resumed(epoch).await || !self.move_cursor(epoch, index) {
                return;
            }

            let utterance = self.build_utterance(sentence);
            debug!("Dispatching sentence {}/{}: '{}'", index + 1, total, utterance.text);

            let Some(dispatched) = self.dispatch(epoch, utterance) else {
                return;
            };
            match dispatched {
                Ok(events) => match self.play_sentence(epoch, index, total, events, &mut started).await {
                    SentenceOutcome::Completed => {}
                    SentenceOutcome::Failed(reason) => {
                        warn!("Skipping sentence {}/{}: {reason}", index + 1, total);
                    }
                    SentenceOutcome::Superseded => return,
                },
                Err(e) => warn!("Skipping sentence {}/{}: {e}", index + 1, total),
            }

            if index + 1 < total {
                tokio::time::sleep(gap).await;
            }
        }

        self.finish(epoch);
    }

    async fn play_sentence(
        &self,
        epoch: u64,
        index: usize,
        total: usize,
        mut events: UtteranceEvents,
        started: &mut bool,
    ) -> SentenceOutcome {
        while let Some(event) = events.recv().await {
            if !self.is_current(epoch) {
                return SentenceOutcome::Superseded;
            }
            match event {
                UtteranceEvent::Started => {
                    if !*started {
                        *started = true;
                        if !self.notify(epoch, mark_speaking, SpeechCallbacks::start) {
                            return SentenceOutcome::Superseded;
                        }
                    }
                    if !self.notify(epoch, |_| {}, |callbacks| callbacks.progress(index, total)) {
                        return SentenceOutcome::Superseded;
                    }
                }
                UtteranceEvent::Ended => return SentenceOutcome::Completed,
                UtteranceEvent::Error(reason) => return SentenceOutcome::Failed(reason),
            }
        }

        if self.is_current(epoch) {
            SentenceOutcome::Failed("engine dropped the utterance".to_string())
        } else {
            SentenceOutcome::Superseded
        }
    }

    /// Wait while paused; returns false once the session is superseded.
    async fn wait_until_resumed(&self, epoch: u64) -> bool {
        let mut paused = self.paused.subscribe();
        loop {
            if !self.is_current(epoch) {
                return false;
            }
            if !*paused.borrow_and_update() {
                return true;
            }
            if paused.changed().await.is_err() {
                return false;
            }
        }
    }

    fn move_cursor(&self, epoch: u64, index: usize) -> bool {
        let mut session = self.session.lock();
        if session.epoch != epoch {
            return false;
        }
        session.status.current_sentence_index = index;
        true
    }

    /// Hand the utterance to the engine unless the session was superseded.
    ///
    /// The epoch check and the dispatch share the status lock, so a
    /// concurrent `stop` either prevents the dispatch or cancels it.
    fn dispatch(&self, epoch: u64, utterance: Utterance) -> Option<NarratorResult<UtteranceEvents>> {
        let session = self.session.lock();
        if session.epoch != epoch {
            debug!("Dropping sentence of superseded session (epoch {epoch})");
            return None;
        }
        Some(self.engine.speak(utterance))
    }

    /// Apply `update` to the status and run `hook` if `epoch` is still current.
    fn notify(
        &self,
        epoch: u64,
        update: impl FnOnce(&mut SpeechStatus),
        hook: impl FnOnce(&SpeechCallbacks),
    ) -> bool {
        let _delivery = self.delivery.lock();
        {
            let mut session = self.session.lock();
            if session.epoch != epoch {
                return false;
            }
            update(&mut session.status);
        }
        let callbacks = self.callbacks.read().clone();
        hook(&callbacks);
        true
    }

    fn build_utterance(&self, text: String) -> Utterance {
        let config = self.config.read().clone();
        let voice = VoiceSelector::from_config(&config).select(&self.engine.voices());
        let lang = voice
            .as_ref()
            .map_or_else(|| config.language.default_tag().to_string(), |v| v.lang.clone());

        Utterance {
            text,
            voice,
            lang,
            rate: config.speech_speed,
            pitch: config.pitch,
            volume: config.volume,
        }
    }

    fn finish(&self, epoch: u64) {
        let finished = self.notify(
            epoch,
            |status| *status = SpeechStatus::default(),
            SpeechCallbacks::end,
        );
        if finished {
            info!("Speech session finished");
        }
    }
}

fn mark_speaking(status: &mut SpeechStatus) {
    if status.state == PlaybackState::Idle {
        status.state = PlaybackState::Speaking;
    }
}
