//! Question answering over the vector store
//!
//! Three pipeline designs share one [`QaPipeline`]:
//! - `direct`: retrieve with the question, then answer
//! - `rewrite`: let the model rewrite the question for retrieval, then answer
//!   the original question
//! - `multi-query`: let the model generate alternative phrasings, retrieve with
//!   each, merge the results, and answer; with no context the fixed
//!   [`NOT_FOUND_ANSWER`] is returned without calling the model
//!
//! Nothing is retried. Any embedding, store or model error is returned as is.

mod multi_query;
mod prompts;

pub use multi_query::{merge_results, parse_generated_queries};
pub use prompts::NOT_FOUND_ANSWER;

use crate::config::{Config, PipelineConfig, PipelineMode};
use crate::embed::{create_embedder, embed_query, Embedder};
use crate::error::{Error, Result};
use crate::llm::{create_chat_model, ChatModel};
use crate::store::{open_store, ScoredChunk, VectorStore};
use futures::future::try_join_all;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Answer to one question plus everything used to produce it
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub question: String,
    pub answer: String,
    pub context: Vec<ScoredChunk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewritten_question: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub generated_queries: Vec<String>,
}

/// Whether a result has sources worth rendering
pub fn should_show_sources(result: &QueryResult) -> bool {
    !result.context.is_empty() && result.answer != NOT_FOUND_ANSWER
}

/// A ready-to-use question answering pipeline
///
/// Holds no per-question state, so one instance serves any number of
/// sequential questions.
pub struct QaPipeline {
    embedder: Arc<dyn Embedder>,
    chat: Arc<dyn ChatModel>,
    store: Arc<dyn VectorStore>,
    settings: PipelineConfig,
}

impl QaPipeline {
    /// Build the models from config and open the existing store
    pub async fn from_config(config: &Config) -> Result<Self> {
        let embedder = create_embedder(config)?;
        let chat = create_chat_model(config)?;
        let store = open_store(config).await?;
        info!(
            "Pipeline ready: mode {}, store {}, chat model {}",
            config.pipeline.mode,
            store.location(),
            chat.model_name()
        );
        Ok(Self::new(embedder, chat, store, config.pipeline.clone()))
    }

    pub fn new(
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
        store: Arc<dyn VectorStore>,
        settings: PipelineConfig,
    ) -> Self {
        Self {
            embedder,
            chat,
            store,
            settings,
        }
    }

    pub fn mode(&self) -> PipelineMode {
        self.settings.mode
    }

    /// Answer a question using the configured design
    pub async fn ask(&self, question: &str) -> Result<QueryResult> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidInput("question must not be empty".to_string()));
        }

        match self.settings.mode {
            PipelineMode::Direct => self.ask_direct(question).await,
            PipelineMode::Rewrite => self.ask_rewrite(question).await,
            PipelineMode::MultiQuery => self.ask_multi_query(question).await,
        }
    }

    async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        let vector = embed_query(self.embedder.as_ref(), query).await?;
        self.store.search(&vector, self.settings.top_k).await
    }

    async fn generate(&self, prompt: String) -> Result<String> {
        let answer = self.chat.complete(&prompt).await?;
        Ok(answer.trim().to_string())
    }

    async fn ask_direct(&self, question: &str) -> Result<QueryResult> {
        let context = self.retrieve(question).await?;
        debug!("Retrieved {} chunks", context.len());

        let stuffed = prompts::stuff_context(context.iter().map(|c| c.chunk.text.as_str()));
        let answer = self.generate(prompts::answer_prompt(&stuffed, question)).await?;

        Ok(QueryResult {
            question: question.to_string(),
            answer,
            context,
            rewritten_question: None,
            generated_queries: Vec::new(),
        })
    }

    async fn ask_rewrite(&self, question: &str) -> Result<QueryResult> {
        let rewritten = self.generate(prompts::rewrite_prompt(question)).await?;
        let rewritten = if rewritten.is_empty() {
            question.to_string()
        } else {
            rewritten
        };
        debug!("Rewritten query: {}", rewritten);

        let context = self.retrieve(&rewritten).await?;
        let stuffed = prompts::stuff_context(context.iter().map(|c| c.chunk.text.as_str()));
        let answer = self.generate(prompts::answer_prompt(&stuffed, question)).await?;

        Ok(QueryResult {
            question: question.to_string(),
            answer,
            context,
            rewritten_question: Some(rewritten),
            generated_queries: Vec::new(),
        })
    }

    async fn ask_multi_query(&self, question: &str) -> Result<QueryResult> {
        let count = self.settings.num_queries;
        let reply = self
            .generate(prompts::multi_query_prompt(question, count))
            .await?;
        let generated = parse_generated_queries(&reply, count);
        debug!("Generated {} alternative queries", generated.len());

        let mut queries = Vec::with_capacity(generated.len() + 1);
        if self.settings.include_original || generated.is_empty() {
            queries.push(question.to_string());
        }
        for query in &generated {
            if !queries.contains(query) {
                queries.push(query.clone());
            }
        }

        let vectors = self.embedder.embed(queries.clone()).await?;
        if vectors.len() != queries.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                queries.len(),
                vectors.len()
            )));
        }

        let result_sets = try_join_all(
            vectors
                .iter()
                .map(|vector| self.store.search(vector, self.settings.top_k)),
        )
        .await?;
        let context = merge_results(result_sets);
        debug!(
            "Merged {} unique chunks from {} queries",
            context.len(),
            queries.len()
        );

        let answer = if context.is_empty() {
            NOT_FOUND_ANSWER.to_string()
        } else {
            let stuffed = prompts::stuff_context(context.iter().map(|c| c.chunk.text.as_str()));
            let answer = self
                .generate(prompts::strict_answer_prompt(&stuffed, question))
                .await?;
            if answer == NOT_FOUND_ANSWER.trim() {
                NOT_FOUND_ANSWER.to_string()
            } else {
                answer
            }
        };

        Ok(QueryResult {
            question: question.to_string(),
            answer,
            context,
            rewritten_question: None,
            generated_queries: generated,
        })
    }
}

/// Process-wide holder for a pipeline built at most once
pub struct PipelineCache {
    cell: OnceCell<Arc<QaPipeline>>,
}

impl PipelineCache {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::const_new(),
        }
    }

    /// Return the cached pipeline, building it with `init` on first use
    ///
    /// A failed build leaves the cache empty so a later call can try again.
    pub async fn get_or_load<F, Fut>(&self, init: F) -> Result<Arc<QaPipeline>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<QaPipeline>>,
    {
        self.cell
            .get_or_try_init(|| async { init().await.map(Arc::new) })
            .await
            .cloned()
    }

    pub fn get(&self) -> Option<Arc<QaPipeline>> {
        self.cell.get().cloned()
    }
}

impl Default for PipelineCache {
    fn default() -> Self {
        Self::new()
    }
}

static PIPELINE: PipelineCache = PipelineCache::new();

/// Get the process-wide pipeline, building it from `config` on first use
///
/// Later calls return the same instance regardless of `config`.
pub async fn load_pipeline(config: &Config) -> Result<Arc<QaPipeline>> {
    PIPELINE.get_or_load(|| QaPipeline::from_config(config)).await
}
