// src/provider/resolver.rs — Provider construction from explicit credentials

use std::sync::Arc;

use super::anthropic::AnthropicProvider;
use super::openai::OpenAiProvider;
use super::{ModelProvider, ModelRef};
use crate::infra::errors::TandemError;

/// API credentials, read from the environment once at startup and passed
/// explicitly into provider constructors. No ambient global state.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            openai_base_url: std::env::var("OPENAI_BASE_URL").ok(),
        }
    }
}

/// Build the provider backing a model reference.
pub fn build_provider(
    creds: &Credentials,
    model_ref: &ModelRef,
) -> Result<Arc<dyn ModelProvider>, TandemError> {
    match model_ref.provider.as_str() {
        "anthropic" => {
            let key = creds
                .anthropic_api_key
                .clone()
                .ok_or_else(|| TandemError::MissingCredentials("anthropic".into()))?;
            Ok(Arc::new(AnthropicProvider::new(key)))
        }
        "openai" => {
            let key = creds
                .openai_api_key
                .clone()
                .ok_or_else(|| TandemError::MissingCredentials("openai".into()))?;
            Ok(match &creds.openai_base_url {
                Some(url) => Arc::new(OpenAiProvider::with_base_url(key, url.clone())),
                None => Arc::new(OpenAiProvider::new(key)),
            })
        }
        other => Err(TandemError::UnknownProvider(other.into())),
    }
}
