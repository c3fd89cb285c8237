//! Operator query command implementation

use anyhow::Result;

use crate::commands::{load_store, print_table_or_empty, ResultRow};
use crate::config::RuntimeContext;
use crate::output::output_for_format;
use crate::query::{advanced_search, QueryClauses};

pub fn run(ctx: &RuntimeContext, expr: &str, explain: bool) -> Result<()> {
    if explain {
        let clauses = QueryClauses::parse(expr);
        return output_for_format(ctx, &clauses, || {
            print_clause("exact", &clauses.exact);
            print_clause("exclude", &clauses.exclude);
            print_clause("include", &clauses.include);
            print_clause("fuzzy", &clauses.fuzzy);
            Ok(())
        });
    }

    let store = load_store(ctx)?;
    let results = advanced_search(store.index(), expr);

    output_for_format(ctx, &results, || {
        let rows: Vec<ResultRow> = results.iter().map(ResultRow::from).collect();
        print_table_or_empty(ctx, &rows, "No entities match query")
    })
}

fn print_clause(label: &str, terms: &[String]) {
    if terms.is_empty() {
        println!("{label:<8} -");
    } else {
        println!("{label:<8} {}", terms.join(", "));
    }
}
