use async_trait::async_trait;
use thiserror::Error;

pub mod chunker;
pub mod cli;
pub mod cooldown;
pub mod discord;
pub mod generators;
pub mod invoker;
pub mod relay;
pub mod web;

/// Outcome of a single successful generation call.
///
/// A call can succeed and still carry no usable text, typically because the
/// provider's content filter withheld the candidate. That case must stay
/// distinguishable from a failed call.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generated {
    Text(String),
    Empty,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Invalid API key.")]
    InvalidApiKey,
    #[error("Malformed request: {0}.")]
    BadRequest(String),
    #[error("Model not found: {0}.")]
    ModelNotFound(String),
    #[error("Rate limit exceeded.")]
    RateLimitExceeded,
    #[error("Model overloaded.")]
    ModelOverloaded,
    #[error("Server error (status {0}).")]
    ServerError(u16),
    #[error("Request timed out.")]
    Timeout,
    #[error("Network error: {0}.")]
    NetworkError(String),
    #[error("Unexpected response: {0}.")]
    UnexpectedResponse(String),
}

impl GenerateError {
    /// Whether this failure aborts a fallback chain instead of moving on to
    /// the next model. Only faults that no alternative model can fix
    /// qualify: bad credentials and malformed requests.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(*self, Self::InvalidApiKey | Self::BadRequest(_))
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<Generated, GenerateError>;
}
