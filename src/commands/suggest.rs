//! Autocomplete suggestions command

use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;

use crate::commands::{load_store, print_table_or_empty};
use crate::config::RuntimeContext;
use crate::fuzzy::Suggestion;
use crate::output::output_for_format;

#[derive(Debug, Tabled, Serialize)]
struct SuggestionRow {
    #[tabled(rename = "ENTITY ID")]
    entity_id: String,
    #[tabled(rename = "SUGGESTION")]
    highlight: String,
    #[tabled(rename = "SCORE")]
    score: String,
}

impl From<&Suggestion> for SuggestionRow {
    fn from(suggestion: &Suggestion) -> Self {
        Self {
            entity_id: suggestion.entity.id.clone(),
            highlight: suggestion.highlight.clone(),
            score: format!("{:.3}", suggestion.score),
        }
    }
}

pub fn run(ctx: &RuntimeContext, term: &str, limit: Option<usize>) -> Result<()> {
    let store = load_store(ctx)?;
    let limit = limit.unwrap_or_else(|| ctx.suggestion_limit());
    let suggestions = store.index().suggestions(term, limit, &ctx.highlight());

    output_for_format(ctx, &suggestions, || {
        let rows: Vec<SuggestionRow> = suggestions.iter().map(SuggestionRow::from).collect();
        print_table_or_empty(ctx, &rows, "No suggestions")
    })
}
