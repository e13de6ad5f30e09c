//! Text generation
//!
//! A single-turn completion trait with an OpenAI-compatible chat backend.

mod http_backend;

pub use http_backend::*;

use crate::config::Config;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for generative models
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete a single user prompt
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Create a chat model based on configuration
pub fn create_chat_model(config: &Config) -> Result<Arc<dyn ChatModel>> {
    let model = HttpChatModel::from_config(config)?;
    Ok(Arc::new(model))
}
