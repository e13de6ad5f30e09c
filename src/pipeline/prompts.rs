//! Prompt templates for rewriting, query expansion and answering

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Fixed answer returned when no context supports an answer
pub const NOT_FOUND_ANSWER: &str =
    "I could not find an answer to that question in the job descriptions.";

const ANSWER_TEMPLATE: &str = "\
Use the following pieces of context to answer the question at the end.
If you don't know the answer, just say that you don't know, don't try to make up an answer.

{context}

Question: {question}
Helpful Answer:";

const STRICT_ANSWER_TEMPLATE: &str = "\
Use only the following pieces of context from job descriptions to answer the question at the end.
If the context does not contain the answer, reply with exactly this sentence and nothing else:
{not_found}

{context}

Question: {question}
Helpful Answer:";

const REWRITE_TEMPLATE: &str = "\
You are helping search a collection of job descriptions.
Rewrite the question below into a search query that will match relevant passages.
Add job-market vocabulary such as role titles, skills, tools, qualifications and responsibilities where it helps.
Reply with the rewritten query only.

Question: {question}
Search query:";

const MULTI_QUERY_TEMPLATE: &str = "\
You are an AI language model assistant. Your task is to generate {count} different versions of the
given user question to retrieve relevant documents from a collection of job descriptions.
By generating multiple perspectives on the user question, your goal is to help the user overcome
some of the limitations of distance-based similarity search.
Provide these alternative questions separated by newlines.

Original question: {question}";

/// Join chunk texts the way a "stuff" chain does: blank line between chunks
pub fn stuff_context<'a>(texts: impl IntoIterator<Item = &'a str>) -> String {
    texts.into_iter().collect::<Vec<_>>().join("\n\n")
}

/// Fill `{name}` placeholders in a single pass, so substituted text is
/// never scanned for further placeholders
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let placeholder = PLACEHOLDER
        .get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("valid placeholder regex"));

    placeholder
        .replace_all(template, |caps: &Captures| {
            values
                .iter()
                .find(|(name, _)| *name == &caps[1])
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

pub fn answer_prompt(context: &str, question: &str) -> String {
    fill(
        ANSWER_TEMPLATE,
        &[("context", context), ("question", question)],
    )
}

/// Answer prompt that instructs the model to fall back to [`NOT_FOUND_ANSWER`]
pub fn strict_answer_prompt(context: &str, question: &str) -> String {
    fill(
        STRICT_ANSWER_TEMPLATE,
        &[
            ("not_found", NOT_FOUND_ANSWER),
            ("context", context),
            ("question", question),
        ],
    )
}

pub fn rewrite_prompt(question: &str) -> String {
    fill(REWRITE_TEMPLATE, &[("question", question)])
}

pub fn multi_query_prompt(question: &str, count: usize) -> String {
    let count = count.to_string();
    fill(
        MULTI_QUERY_TEMPLATE,
        &[("count", count.as_str()), ("question", question)],
    )
}
