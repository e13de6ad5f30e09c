//! Ask command implementation

use crate::config::Config;
use crate::error::Result;
use crate::pipeline::{load_pipeline, should_show_sources, QueryResult};
use tracing::info;

/// Characters of chunk text shown per source
const SOURCE_PREVIEW_CHARS: usize = 250;

/// Answer a single question with the cached pipeline
pub async fn cmd_ask(config: &Config, question: &str) -> Result<QueryResult> {
    info!("Asking: {}", question);
    let pipeline = load_pipeline(config).await?;
    pipeline.ask(question).await
}

/// First `SOURCE_PREVIEW_CHARS` characters of a chunk, on char boundaries
pub fn source_preview(text: &str) -> String {
    text.chars().take(SOURCE_PREVIEW_CHARS).collect()
}

/// Print an answer, with sources when requested and available
pub fn print_answer(result: &QueryResult, show_sources: bool) {
    if let Some(rewritten) = &result.rewritten_question {
        println!("\nSearch query: {}", rewritten);
    }
    if !result.generated_queries.is_empty() {
        println!("\nSearched for:");
        for query in &result.generated_queries {
            println!("  • {}", query);
        }
    }

    println!("\nAnswer\n");
    println!("{}", result.answer);

    if show_sources && should_show_sources(result) {
        print_sources(result);
    }
}

/// Print the chunks an answer was generated from
pub fn print_sources(result: &QueryResult) {
    println!("\nSources\n");
    println!("The following sources were used to generate the answer:");
    for hit in &result.context {
        println!("\nSource: {}", hit.chunk.metadata.source);
        println!("Content: {}...", source_preview(&hit.chunk.text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_preview_truncates_by_chars() {
        let text = "é".repeat(300);
        let preview = source_preview(&text);
        assert_eq!(preview.chars().count(), 250);
    }

    #[test]
    fn test_source_preview_keeps_short_text() {
        assert_eq!(source_preview("Python and SQL"), "Python and SQL");
    }
}
