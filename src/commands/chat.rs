//! Interactive question loop

use super::ask::print_answer;
use crate::config::Config;
use crate::error::Result;
use crate::pipeline::{load_pipeline, QaPipeline};
use crate::progress::add_spinner;
use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

const PROMPT: &str = "Ask a question: ";
const EXAMPLE_QUESTION: &str = "What are the common skills required for a data scientist?";

/// Words that end the session
fn is_exit(line: &str) -> bool {
    matches!(line, "" | "exit" | "quit")
}

/// Read questions from stdin and answer them until an empty line, `exit` or EOF
///
/// Failures while answering are printed and the loop carries on; only a
/// failure to build the pipeline ends the session with an error.
pub async fn cmd_chat(config: &Config, show_sources: bool) -> Result<()> {
    let pipeline = load_pipeline(config).await?;

    println!("JobSift: your personal job insights assistant");
    println!("Ask anything about the job descriptions in your knowledge base.");
    println!("Example: {}", EXAMPLE_QUESTION);
    println!("Press Enter on an empty line, or type 'exit', to leave.\n");

    chat_loop(&pipeline, BufReader::new(tokio::io::stdin()), show_sources).await?;

    debug!("Chat session ended");
    Ok(())
}

async fn chat_loop<R>(pipeline: &QaPipeline, reader: R, show_sources: bool) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        print!("{}", PROMPT);
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if is_exit(question) {
            break;
        }

        answer_one(pipeline, question, show_sources).await;
        println!();
    }
    Ok(())
}

async fn answer_one(pipeline: &QaPipeline, question: &str, show_sources: bool) {
    let spinner = add_spinner("Searching for the answer...");
    let result = pipeline.ask(question).await;
    spinner.finish_and_clear();

    match result {
        Ok(result) => print_answer(&result, show_sources),
        Err(e) => println!("An error occurred: {}", e),
    }
}
