// src/infra/errors.rs — Error types for tandem

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TandemError {
    // Provider errors (retriable flag is advisory; the loop never retries)
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    #[error("Rate limited by '{provider}', retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    // User errors
    #[error("No API key for provider '{0}'. Set ANTHROPIC_API_KEY / OPENAI_API_KEY.")]
    MissingCredentials(String),

    #[error("Unknown provider '{0}' (expected 'anthropic' or 'openai')")]
    UnknownProvider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // Infra
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TandemError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            TandemError::Provider {
                retriable: true,
                ..
            } | TandemError::RateLimited { .. }
        )
    }
}
