//! Query expansion parsing and result merging for multi-query retrieval

use crate::store::ScoredChunk;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn strip_list_marker(line: &str) -> String {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    // "1. " / "2) " / "- " / "* " / "• " prefixes; "3.5 years" is not a marker
    let marker = MARKER
        .get_or_init(|| Regex::new(r"^\s*(?:\d+[.)]|[-*•])\s+").expect("valid marker regex"));
    marker.replace(line, "").into_owned()
}

/// Split a model reply into at most `limit` queries, one per line, with list
/// markers and surrounding quotes removed
pub fn parse_generated_queries(reply: &str, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    reply
        .lines()
        .map(|line| {
            strip_list_marker(line)
                .trim()
                .trim_matches('"')
                .trim()
                .to_string()
        })
        .filter(|q| !q.is_empty())
        .filter(|q| seen.insert(q.clone()))
        .take(limit)
        .collect()
}

/// Concatenate per-query results in query order, keeping the first
/// occurrence of each chunk id
pub fn merge_results(result_sets: Vec<Vec<ScoredChunk>>) -> Vec<ScoredChunk> {
    let mut seen = HashSet::new();
    result_sets
        .into_iter()
        .flatten()
        .filter(|hit| seen.insert(hit.chunk.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Chunk;

    fn hit(source: &str, text: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk::new(source, 0, text.to_string()),
            score,
        }
    }

    #[test]
    fn test_parse_strips_markers_and_blanks() {
        let reply = "1. What tools do data scientists use?\n\n2) Which programming languages are required?\n- \"Is SQL needed?\"\n";
        assert_eq!(
            parse_generated_queries(reply, 5),
            vec![
                "What tools do data scientists use?",
                "Which programming languages are required?",
                "Is SQL needed?",
            ]
        );
    }

    #[test]
    fn test_parse_caps_and_dedupes() {
        let reply = "a\na\nb\nc\nd";
        assert_eq!(parse_generated_queries(reply, 3), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_keeps_numbers_inside_text() {
        assert_eq!(
            parse_generated_queries("Jobs needing 5 years of Python", 3),
            vec!["Jobs needing 5 years of Python"]
        );
        assert_eq!(
            parse_generated_queries("3.5 years of Python experience required?", 3),
            vec!["3.5 years of Python experience required?"]
        );
        assert_eq!(
            parse_generated_queries("-10% travel expected?", 3),
            vec!["-10% travel expected?"]
        );
    }

    #[test]
    fn test_merge_keeps_first_occurrence_in_query_order() {
        let merged = merge_results(vec![
            vec![hit("a.txt", "alpha", 0.9), hit("b.txt", "beta", 0.5)],
            vec![hit("b.txt", "beta", 0.8), hit("c.txt", "gamma", 0.7)],
        ]);

        let texts: Vec<_> = merged.iter().map(|h| h.chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["alpha", "beta", "gamma"]);
        assert_eq!(merged[1].score, 0.5);
    }

    #[test]
    fn test_merge_of_empty_sets_is_empty() {
        assert!(merge_results(vec![vec![], vec![]]).is_empty());
    }
}
