//! Text search tool: ranks a small document corpus against a query.
//!
//! Every document scores the number of distinct lowercase query terms that
//! appear in its title or snippet. Ties keep corpus order. The top `top_k`
//! documents with a non-zero score are returned as numbered lines.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use taskweave_core::error::ToolError;
use taskweave_core::tool::Tool;
use tracing::debug;

/// Name the tool is registered under.
pub const SEARCH_TOOL_NAME: &str = "search_web";

/// One searchable document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub title: String,
    pub snippet: String,
}

impl SearchDocument {
    pub fn new(title: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
        }
    }

    fn score(&self, terms: &BTreeSet<String>) -> usize {
        let haystack = format!("{} {}", self.title, self.snippet).to_lowercase();
        terms.iter().filter(|t| haystack.contains(t.as_str())).count()
    }
}

/// Corpus used when no documents are configured.
pub fn builtin_corpus() -> Vec<SearchDocument> {
    vec![
        SearchDocument::new(
            "Competitor pricing overview",
            "Most competitors price entry plans between $10 and $30 per month.",
        ),
        SearchDocument::new(
            "Product launch checklist",
            "Positioning, pricing, launch timeline, press kit and a support rota.",
        ),
        SearchDocument::new(
            "Go-to-market timeline template",
            "Plan the launch timeline backwards from the release date in weekly milestones.",
        ),
        SearchDocument::new(
            "Rust async basics",
            "Futures are lazy; an executor such as tokio polls them to completion.",
        ),
        SearchDocument::new(
            "Writing a press release",
            "Lead with the news, quote a customer, end with a clear call to action.",
        ),
    ]
}

/// Keyword search over an in-process corpus.
pub struct TextSearchTool {
    documents: Vec<SearchDocument>,
    top_k: usize,
}

impl TextSearchTool {
    pub fn new(documents: Vec<SearchDocument>, top_k: usize) -> Self {
        Self {
            documents,
            top_k: top_k.max(1),
        }
    }

    /// Rank the corpus for `query`, best first.
    pub fn search(&self, query: &str) -> Vec<&SearchDocument> {
        let terms: BTreeSet<String> = query
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();

        let mut scored: Vec<(usize, &SearchDocument)> = self
            .documents
            .iter()
            .map(|d| (d.score(&terms), d))
            .filter(|(score, _)| *score > 0)
            .collect();

        // Stable sort keeps corpus order among equal scores.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().take(self.top_k).map(|(_, d)| d).collect()
    }
}

impl Default for TextSearchTool {
    fn default() -> Self {
        Self::new(builtin_corpus(), 3)
    }
}

#[async_trait]
impl Tool for TextSearchTool {
    fn name(&self) -> &str {
        SEARCH_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Search reference documents. Parameter: a free-text query. Returns the best matching snippets."
    }

    async fn invoke(&self, parameter: &str) -> Result<String, ToolError> {
        let query = parameter.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidArguments("search query is empty".into()));
        }

        let hits = self.search(query);
        debug!(query, hits = hits.len(), "Text search");

        if hits.is_empty() {
            return Ok(format!("No results for '{query}'"));
        }

        Ok(hits
            .iter()
            .enumerate()
            .map(|(i, d)| format!("{}. {}: {}", i + 1, d.title, d.snippet))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
