//! Error types for the narrator speech queue.

/// Result type alias for narrator operations
pub type NarratorResult<T> = Result<T, NarratorError>;

/// Main error type for narrator operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NarratorError {
    /// The speech engine failed to dispatch or play an utterance
    #[error("Speech engine error: {message}")]
    EngineError {
        /// Error message describing the failure
        message: String,
    },

    /// The platform has no usable speech engine
    #[error("Speech engine unavailable: {message}")]
    EngineUnavailable {
        /// Error message describing why the engine is unavailable
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Error message describing the configuration issue
        message: String,
    },

    /// File I/O error
    #[error("File I/O error: {message}")]
    FileError {
        /// Error message describing the file operation failure
        message: String,
    },
}

impl NarratorError {
    /// Create a new engine error
    #[must_use]
    pub fn engine<S: Into<String>>(message: S) -> Self {
        Self::EngineError {
            message: message.into(),
        }
    }

    /// Create a new engine unavailable error
    #[must_use]
    pub fn engine_unavailable<S: Into<String>>(message: S) -> Self {
        Self::EngineUnavailable {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    #[must_use]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Create a new file error
    #[must_use]
    pub fn file<S: Into<String>>(message: S) -> Self {
        Self::FileError {
            message: message.into(),
        }
    }

    /// Check if this error is due to a bad configuration value or file
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::ConfigurationError { .. } | Self::FileError { .. })
    }

    /// Get the error category for logging
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::EngineError { .. } => "engine",
            Self::EngineUnavailable { .. } => "engine_unavailable",
            Self::ConfigurationError { .. } => "configuration",
            Self::FileError { .. } => "file",
        }
    }
}

impl From<toml::de::Error> for NarratorError {
    fn from(err: toml::de::Error) -> Self {
        Self::configuration(format!("TOML parse error: {err}"))
    }
}
