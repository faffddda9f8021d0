//! Startup helpers for the Docpal assistant.
//!
//! Host applications (popup UI, service worker, test harness) wire the
//! engine through these helpers instead of assembling the collaborators
//! by hand.

use std::path::Path;
use std::sync::Arc;

use crate::assistant::Assistant;
use crate::conversations::ConversationStore;
use crate::llm::{GeminiClient, GeminiConfig};
use crate::storage::{MemoryBackend, SqliteBackend};

/// Environment variable carrying the Gemini API key.
pub const GEMINI_API_KEY_ENV: &str = "DOCPAL_GEMINI_API_KEY";

/// Environment variable overriding the conversation database path.
pub const DB_PATH_ENV: &str = "DOCPAL_DB_PATH";

/// Default conversation database path.
pub const DEFAULT_DB_PATH: &str = "docpal.sqlite";

/// Boxed error for wiring failures.
pub type StartupError = Box<dyn std::error::Error + Send + Sync>;

/// Install a fmt tracing subscriber honouring `RUST_LOG`, defaulting to
/// `INFO`. Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}

/// Build an assistant persisting history to `SQLite` at `db_path`.
///
/// # Errors
/// Returns an error if the database cannot be opened or the API
/// configuration is invalid.
pub async fn build_assistant(api_key: &str, db_path: &Path) -> Result<Assistant, StartupError> {
    tracing::info!(
        "Starting Docpal assistant v{} (db: {})",
        env!("CARGO_PKG_VERSION"),
        db_path.display()
    );

    let backend = SqliteBackend::open(db_path).await?;
    let store = ConversationStore::new(Arc::new(backend));
    let generator = GeminiClient::new(GeminiConfig::new(api_key))?;

    Ok(Assistant::new(store, Arc::new(generator)))
}

/// Build an assistant whose history lives only in memory.
///
/// # Errors
/// Returns an error if the API configuration is invalid.
pub fn build_ephemeral_assistant(api_key: &str) -> Result<Assistant, StartupError> {
    let store = ConversationStore::new(Arc::new(MemoryBackend::new()));
    let generator = GeminiClient::new(GeminiConfig::new(api_key))?;

    Ok(Assistant::new(store, Arc::new(generator)))
}

/// Build a durable assistant from [`GEMINI_API_KEY_ENV`] and
/// [`DB_PATH_ENV`] (falling back to [`DEFAULT_DB_PATH`]).
///
/// # Errors
/// Returns an error if the API key variable is unset or wiring fails.
pub async fn build_assistant_from_env() -> Result<Assistant, StartupError> {
    let api_key = std::env::var(GEMINI_API_KEY_ENV)
        .map_err(|_| format!("{GEMINI_API_KEY_ENV} must be set"))?;
    let db_path =
        std::env::var(DB_PATH_ENV).unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

    build_assistant(&api_key, Path::new(&db_path)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ephemeral_assistant_wires_up() {
        let assistant = build_ephemeral_assistant("key");
        assert!(assistant.is_ok());
    }

    #[test]
    fn test_empty_api_key_is_rejected() {
        let assistant = build_ephemeral_assistant("   ");
        assert!(assistant.is_err());
    }
}
