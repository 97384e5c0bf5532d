//! Built-in tool implementations for Taskweave.
//!
//! The registry is assembled once at startup and is read-only while runs
//! are in flight.

pub mod search;

use taskweave_core::tool::ToolRegistry;

pub use search::{SEARCH_TOOL_NAME, SearchDocument, TextSearchTool, builtin_corpus};

/// Create a registry with the built-in tools over the built-in corpus.
pub fn default_registry() -> ToolRegistry {
    registry_with_corpus(builtin_corpus(), 3)
}

/// Create a registry whose search tool ranks `documents`.
///
/// An empty `documents` list falls back to the built-in corpus.
pub fn registry_with_corpus(documents: Vec<SearchDocument>, top_k: usize) -> ToolRegistry {
    let documents = if documents.is_empty() {
        builtin_corpus()
    } else {
        documents
    };

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(TextSearchTool::new(documents, top_k)));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_search() {
        let registry = default_registry();
        assert_eq!(registry.names(), vec![SEARCH_TOOL_NAME]);
        assert_eq!(registry.describe_all()[0].name, SEARCH_TOOL_NAME);
    }

    #[tokio::test]
    async fn configured_corpus_is_used() {
        let registry = registry_with_corpus(vec![SearchDocument::new("Only", "custom doc")], 5);
        let output = registry.invoke(SEARCH_TOOL_NAME, "custom").await.unwrap();
        assert_eq!(output, "1. Only: custom doc");
    }
}
