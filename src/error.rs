use thiserror::Error;

/// Failure reported by a spelling rule while expanding a key.
///
/// Rules return this to abort the `set`/`get` call that invoked them; the
/// index never retries or swallows it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SpellingError {
    message: String,
}

impl SpellingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("spelling rule failed for key {key:?}: {source}")]
    Spelling {
        key: String,
        #[source]
        source: SpellingError,
    },
    #[error("invalid spelling pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("spelling weight {0} is outside (0, 1]")]
    InvalidWeight(f64),
}
