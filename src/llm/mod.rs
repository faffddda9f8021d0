//! Answer generation.
//!
//! The orchestrator only depends on the [`AnswerGenerator`] seam; the
//! Gemini client in [`gemini`] is the production implementation.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

pub mod gemini;

pub use gemini::{GeminiClient, GeminiConfig};

/// Boxed future type for generation calls.
pub type GenerateFuture<'a> = Pin<Box<dyn Future<Output = Result<String, ApiError>> + Send + 'a>>;

/// Errors produced by answer generation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid client configuration (e.g., unparsable base URL).
    #[error("invalid api configuration: {0}")]
    InvalidConfig(String),
    /// Transport-level HTTP failure.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
    /// The provider reported quota exhaustion.
    #[error("api quota exceeded")]
    QuotaExhausted,
    /// The provider rejected the request.
    #[error("api request failed: {0}")]
    Rejected(String),
    /// The response body did not carry a generated candidate.
    #[error("invalid response format from api")]
    MalformedResponse,
}

/// Generates an answer to a question about the supplied page context.
///
/// The context string is produced by page-content extraction elsewhere and
/// consumed opaquely here.
pub trait AnswerGenerator: Send + Sync {
    /// Generate an answer.
    ///
    /// # Errors
    /// Returns an [`ApiError`] if the generation call fails.
    fn generate<'a>(&'a self, question: &'a str, context: &'a str) -> GenerateFuture<'a>;
}
