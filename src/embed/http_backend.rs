use super::Embedder;
use crate::api_client::ApiClient;
use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint
pub struct HttpEmbedder {
    client: ApiClient,
    model_id: String,
}

impl HttpEmbedder {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ApiClient::from_config(config)?;
        Ok(Self::new(client, config.embedding.model.clone()))
    }

    pub fn new(client: ApiClient, model_id: String) -> Self {
        Self { client, model_id }
    }

    fn validate_dimensions(&self, embeddings: &[Vec<f32>]) -> Result<()> {
        let Some(first) = embeddings.first() else {
            return Ok(());
        };
        if first.is_empty() {
            return Err(Error::Embedding(format!(
                "Model '{}' returned an empty embedding",
                self.model_id
            )));
        }
        if let Some(mismatch) = embeddings.iter().find(|vec| vec.len() != first.len()) {
            return Err(Error::Embedding(format!(
                "Embedding dimension mismatch for model '{}': expected {}, got {}",
                self.model_id,
                first.len(),
                mismatch.len()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.client.embeddings(&self.model_id, &texts).await?;
        self.validate_dimensions(&embeddings)?;
        Ok(embeddings)
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}
