//! dashq - fuzzy search, filtering and grouping for smart-home dashboards
//!
//! Loads an entity catalog (from a file or the built-in demo data) and
//! answers dashboard-style questions about it from the terminal.

mod activity;
mod catalog;
mod category;
mod cli;
mod commands;
mod config;
mod entity;
mod fuzzy;
mod output;
mod panel;
mod query;
mod translate;
mod worker;

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};
use crate::config::RuntimeContext;

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = writeln!(io::stderr(), "Error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = RuntimeContext::new(&cli.global)?;
    ctx.init_logging()?;

    log::debug!("Config loaded from: {:?}", ctx.config_path());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_command(&ctx, cli.command))
}

async fn run_command(ctx: &RuntimeContext, command: Command) -> Result<()> {
    match command {
        Command::Search {
            term,
            limit,
            background,
        } => commands::search::run(ctx, &term, limit, background).await,
        Command::Query { expr, explain } => commands::query::run(ctx, &expr.join(" "), explain),
        Command::Suggest { term, limit } => commands::suggest::run(ctx, &term, limit),
        Command::List {
            category,
            subcategory,
            by_area,
        } => commands::browse::list(ctx, category, &subcategory, by_area),
        Command::Counts { category, by_area } => commands::browse::counts(ctx, category, by_area),
        Command::Show { entity_id } => commands::show::run(ctx, &entity_id),
        Command::Panel => commands::panel::run(ctx).await,
        Command::Config { command } => commands::config::run(ctx, command),
        Command::Completions { shell } => commands::completions::run(shell),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_query_with_sigils() {
        let cli = Cli::try_parse_from(["dashq", "query", "!garage", "'door", "cover~"]).unwrap();
        match cli.command {
            Command::Query { expr, explain } => {
                assert_eq!(expr.join(" "), "!garage 'door cover~");
                assert!(!explain);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_list_defaults() {
        let cli = Cli::try_parse_from(["dashq", "list"]).unwrap();
        match cli.command {
            Command::List {
                category,
                subcategory,
                by_area,
            } => {
                assert_eq!(category, category::Category::Devices);
                assert_eq!(subcategory, "all");
                assert!(!by_area);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
