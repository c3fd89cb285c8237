//! Operator syntax layered over fuzzy search
//!
//! A query is split on whitespace and each token is classified by its sigil:
//!
//! | token     | clause  | effect                                        |
//! |-----------|---------|-----------------------------------------------|
//! | `!term`   | exclude | drop entities whose name contains `term`      |
//! | `=term`   | exact   | keep only entities named exactly `term`       |
//! | `'term`   | include | keep only entities whose name contains `term` |
//! | `term~`   | fuzzy   | fuzzy search (same as a bare term)            |
//! | `term`    | fuzzy   | fuzzy search                                  |
//!
//! All name comparisons ignore case.

use serde::Serialize;

use crate::fuzzy::{SearchIndex, SearchResult};

/// Clauses parsed from one query string, in token order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryClauses {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub exact: Vec<String>,
    pub fuzzy: Vec<String>,
}

impl QueryClauses {
    /// Tokenize a query; never fails, an empty string yields no clauses
    pub fn parse(query: &str) -> Self {
        let mut clauses = Self::default();

        for token in query.split_whitespace() {
            let (list, text) = if let Some(rest) = token.strip_prefix('!') {
                (&mut clauses.exclude, rest)
            } else if let Some(rest) = token.strip_prefix('=') {
                (&mut clauses.exact, rest)
            } else if let Some(rest) = token.strip_prefix('\'') {
                (&mut clauses.include, rest)
            } else if let Some(rest) = token.strip_suffix('~') {
                (&mut clauses.fuzzy, rest)
            } else {
                (&mut clauses.fuzzy, token)
            };

            // A bare sigil carries no term
            if !text.is_empty() {
                list.push(text.to_string());
            }
        }

        clauses
    }

    /// Evaluate against an index
    ///
    /// Stages run in order on the survivors of the previous stage: exact,
    /// exclude, include. Fuzzy terms then replace the working set with a
    /// fresh fuzzy search over the whole index, so the earlier narrowing does
    /// not carry over when fuzzy terms are present.
    pub fn evaluate(&self, index: &SearchIndex) -> Vec<SearchResult> {
        let mut results = index.search("");

        if !self.exact.is_empty() {
            let exact: Vec<String> = self.exact.iter().map(|t| t.to_lowercase()).collect();
            results.retain(|r| {
                let name = r.entity.name.to_lowercase();
                exact.iter().any(|t| *t == name)
            });
        }

        if !self.exclude.is_empty() {
            let exclude: Vec<String> = self.exclude.iter().map(|t| t.to_lowercase()).collect();
            results.retain(|r| {
                let name = r.entity.name.to_lowercase();
                !exclude.iter().any(|t| name.contains(t.as_str()))
            });
        }

        if !self.include.is_empty() {
            let include: Vec<String> = self.include.iter().map(|t| t.to_lowercase()).collect();
            results.retain(|r| {
                let name = r.entity.name.to_lowercase();
                include.iter().all(|t| name.contains(t.as_str()))
            });
        }

        if !self.fuzzy.is_empty() {
            results = index.search(&self.fuzzy.join(" "));
        }

        log::debug!(
            "Query clauses: {} exact, {} exclude, {} include, {} fuzzy -> {} results",
            self.exact.len(),
            self.exclude.len(),
            self.include.len(),
            self.fuzzy.len(),
            results.len()
        );
        results
    }
}

/// Parse and evaluate a query string in one go
pub fn advanced_search(index: &SearchIndex, query: &str) -> Vec<SearchResult> {
    QueryClauses::parse(query).evaluate(index)
}
