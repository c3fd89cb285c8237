//! Output formatting utilities
//!
//! Handles JSON, YAML, and table output formats.

use std::io::IsTerminal;

use anyhow::Result;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::cli::OutputFormat;
use crate::config::RuntimeContext;

/// Format and print data according to the configured output format
pub fn print_output<T: Serialize>(ctx: &RuntimeContext, data: &T) -> Result<()> {
    let output = format_output(ctx.output_format(), std::io::stdout().is_terminal(), data)?;
    println!("{output}");
    Ok(())
}

/// Format data for a machine-readable format
///
/// Table and auto fall back to JSON, compact when not writing to a terminal.
pub fn format_output<T: Serialize>(format: OutputFormat, is_tty: bool, data: &T) -> Result<String> {
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(data)?),
        OutputFormat::Json | OutputFormat::Table | OutputFormat::Auto => {
            if is_tty {
                Ok(serde_json::to_string_pretty(data)?)
            } else {
                Ok(serde_json::to_string(data)?)
            }
        }
    }
}

/// Serialize `data` for json/yaml, otherwise run the human-readable renderer
///
/// `auto` picks the renderer on a terminal and JSON when piped.
pub fn output_for_format<T, F>(ctx: &RuntimeContext, data: &T, render: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce() -> Result<()>,
{
    let format = ctx.output_format();
    let is_tty = std::io::stdout().is_terminal();

    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_output(ctx, data),
        OutputFormat::Auto if !is_tty => print_output(ctx, data),
        OutputFormat::Table | OutputFormat::Auto => render(),
    }
}

/// Print a table from items that implement Tabled
pub fn print_table<T: Tabled>(ctx: &RuntimeContext, items: &[T]) -> Result<()> {
    let no_headers = ctx.global.no_headers || ctx.config.output.no_headers;
    println!("{}", build_table(items, no_headers));
    Ok(())
}

fn build_table<T: Tabled>(items: &[T], no_headers: bool) -> Table {
    let mut table = Table::new(items);
    table.with(Style::sharp());

    if no_headers {
        table.with(tabled::settings::Remove::row(
            tabled::settings::object::Rows::first(),
        ));
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Tabled)]
    struct Row {
        id: String,
        state: String,
    }

    fn rows() -> Vec<Row> {
        vec![Row {
            id: "light.kitchen".to_string(),
            state: "on".to_string(),
        }]
    }

    #[test]
    fn test_format_output_json() {
        let out = format_output(OutputFormat::Json, false, &rows()).unwrap();
        assert_eq!(out, r#"[{"id":"light.kitchen","state":"on"}]"#);

        let pretty = format_output(OutputFormat::Json, true, &rows()).unwrap();
        assert!(pretty.contains('\n'));
    }

    #[test]
    fn test_format_output_yaml() {
        let out = format_output(OutputFormat::Yaml, false, &rows()).unwrap();
        assert!(out.contains("id: light.kitchen"));
    }

    #[test]
    fn test_build_table_headers() {
        let with_headers = build_table(&rows(), false).to_string();
        assert!(with_headers.contains("state"));
        assert!(with_headers.contains("light.kitchen"));

        let without = build_table(&rows(), true).to_string();
        assert!(!without.contains("state"));
        assert!(without.contains("light.kitchen"));
    }
}
