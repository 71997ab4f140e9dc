/// Failure kinds of a single generation call

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    /// Caller input was unusable; retrying the same request will not help
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The provider answered without any content
    #[error("No workflow generated")]
    GenerationEmpty,

    /// The provider answered with something that is not a workflow object
    #[error("Malformed workflow reply: {0}")]
    GenerationMalformed(String),

    /// Transport, timeout, or provider-side failure
    #[error("Generation provider unavailable: {0}")]
    GenerationUnavailable(String),
}

impl GenerationError {
    /// Only availability failures are worth retrying with backoff
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::GenerationUnavailable(_))
    }

    /// Stable short tag used in usage logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::GenerationEmpty => "generation_empty",
            Self::GenerationMalformed(_) => "generation_malformed",
            Self::GenerationUnavailable(_) => "generation_unavailable",
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        Self::GenerationUnavailable(err.to_string())
    }
}
