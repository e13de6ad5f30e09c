use super::ChatModel;
use crate::api_client::{ApiClient, ChatMessage};
use crate::config::Config;
use crate::error::Result;
use async_trait::async_trait;
use tracing::debug;

/// Chat model backed by an OpenAI-compatible `/chat/completions` endpoint
pub struct HttpChatModel {
    client: ApiClient,
    model_id: String,
    temperature: f32,
}

impl HttpChatModel {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ApiClient::from_config(config)?;
        Ok(Self::new(
            client,
            config.llm.model.clone(),
            config.llm.temperature,
        ))
    }

    pub fn new(client: ApiClient, model_id: String, temperature: f32) -> Self {
        Self {
            client,
            model_id,
            temperature,
        }
    }
}

#[async_trait]
impl ChatModel for HttpChatModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!("Completing prompt of {} chars with {}", prompt.len(), self.model_id);
        let messages = [ChatMessage::user(prompt)];
        self.client
            .chat(&self.model_id, &messages, self.temperature)
            .await
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}
