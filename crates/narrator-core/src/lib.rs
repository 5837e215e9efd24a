//! # Narrator Core
//!
//! Sequenced text-to-speech narration for EvoFinz.
//!
//! ## Features
//!
//! - Markdown and emoji cleanup before text reaches the speech engine
//! - Sentence segmentation with per-sentence progress callbacks
//! - Debounced `speak` requests; a newer request always supersedes an older one
//! - Pause, resume and stop controls over a single active session
//! - Voice selection by name, locale preference order and gender
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use narrator_core::{MockSpeechEngine, SpeechCallbacks, SpeechManager};
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = Arc::new(MockSpeechEngine::new());
//!     let manager = SpeechManager::new(engine).with_callbacks(
//!         SpeechCallbacks::new()
//!             .on_progress(|index, total| println!("sentence {}/{}", index + 1, total))
//!             .on_end(|| println!("done")),
//!     );
//!
//!     manager.speak("**Resumen:** gastaste menos este mes. ¡Bien hecho! 🎉");
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod engine;
pub mod error;
pub mod mock_engine;
pub mod speech_manager;
pub mod text;
pub mod voice_manager;

// Re-export main types for convenience
pub use config::{Language, SpeechConfig, SpeechTiming};
pub use engine::{SpeechEngine, Utterance, UtteranceEvent, UtteranceEvents};
pub use error::{NarratorError, NarratorResult};
pub use mock_engine::MockSpeechEngine;
pub use speech_manager::{PlaybackState, SpeechCallbacks, SpeechManager, SpeechStatus};
pub use text::{clean_text, split_sentences};
pub use voice_manager::{Voice, VoiceGender, VoiceSelector};

/// Version information for the narrator-core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default quiet window before a `speak` request starts playback (milliseconds)
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

/// Default pause between consecutive sentences (milliseconds)
pub const DEFAULT_SENTENCE_GAP_MS: u64 = 400;
