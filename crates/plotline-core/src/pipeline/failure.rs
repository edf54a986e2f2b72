use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Shown when the run exceeds its streaming deadline.
pub const TIMEOUT_MESSAGE: &str =
    "The analysis is taking longer than expected. Please try again with a smaller file.";
/// Shown when the event stream drops for network-looking reasons.
pub const CONNECTION_MESSAGE: &str =
    "The connection to the analysis service was interrupted. Please try again.";
/// Shown for stream failures with no recognizable cause.
pub const GENERIC_MESSAGE: &str = "Something went wrong while analyzing your file.";

static CONNECTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)connection|connect|network|reset|refused|broken pipe|closed before")
        .expect("connection pattern must compile")
});

/// Why a pipeline run did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunFailure {
    /// The upload request itself was rejected.
    #[error("upload submission failed: {cause}")]
    Submit { cause: String },
    /// The pipeline reported an error stage.
    #[error("pipeline stage failed: {cause}")]
    Stage { cause: String },
    /// The event stream broke before a terminal stage arrived.
    #[error("event stream failed: {cause}")]
    Channel { cause: String },
    /// No terminal stage arrived within the streaming deadline.
    #[error("pipeline run timed out")]
    Timeout,
}

impl RunFailure {
    pub fn submit(cause: impl Into<String>) -> Self {
        Self::Submit {
            cause: cause.into(),
        }
    }

    pub fn stage(cause: impl Into<String>) -> Self {
        Self::Stage {
            cause: cause.into(),
        }
    }

    pub fn channel(cause: impl Into<String>) -> Self {
        Self::Channel {
            cause: cause.into(),
        }
    }

    /// Raw cause text, if this failure carries one.
    pub fn cause(&self) -> Option<&str> {
        match self {
            Self::Submit { cause } | Self::Stage { cause } | Self::Channel { cause } => {
                Some(cause)
            }
            Self::Timeout => None,
        }
    }

    /// Message suitable for showing in the conversation transcript.
    pub fn user_message(&self) -> String {
        match self {
            Self::Timeout => TIMEOUT_MESSAGE.to_string(),
            Self::Submit { cause } => {
                format!(
                    "The file could not be submitted: {}.",
                    cause.trim_end_matches('.')
                )
            }
            Self::Stage { cause } => {
                format!("The analysis failed: {}.", cause.trim_end_matches('.'))
            }
            Self::Channel { cause } => {
                if CONNECTION_PATTERN.is_match(cause) {
                    CONNECTION_MESSAGE.to_string()
                } else {
                    GENERIC_MESSAGE.to_string()
                }
            }
        }
    }
}
