//! Interactive panel
//!
//! Reads lines from stdin. Plain text becomes the search term; lines starting
//! with `:` drive the category state. The view is re-rendered after every line.

use std::io::Write;

use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::activity::SearchActivity;
use crate::catalog::CatalogStore;
use crate::category::{Category, SubcategoryMode};
use crate::commands::{load_store, print_counts, print_groups, print_table_or_empty, EntityRow};
use crate::config::RuntimeContext;
use crate::output::output_for_format;
use crate::panel::{group_results, PanelState, PanelView};
use crate::worker;

const HELP: &str = "\
Type to search, or:
  :cat <devices|sensors|actions|custom>   switch category
  :sub <key>                              toggle a subcategory chip
  :mode <categories|areas>                bucket by domain or by area
  :clear                                  clear the search term
  :reload                                 re-read the catalog
  :status                                 show the panel state
  :help                                   show this help
  :quit                                   leave the panel";

#[derive(Debug, Clone, PartialEq, Eq)]
enum PanelInput {
    Search(String),
    Refresh,
    Clear,
    Category(Category),
    Subcategory(String),
    Mode(SubcategoryMode),
    Reload,
    Status,
    Help,
    Quit,
}

fn parse_input(line: &str) -> Result<PanelInput> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(PanelInput::Refresh);
    }

    let Some(command) = line.strip_prefix(':') else {
        return Ok(PanelInput::Search(line.to_string()));
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    let require_arg = || {
        if arg.is_empty() {
            Err(anyhow!(":{name} needs an argument"))
        } else {
            Ok(arg)
        }
    };

    Ok(match name {
        "cat" | "category" => PanelInput::Category(require_arg()?.parse()?),
        "sub" => PanelInput::Subcategory(require_arg()?.to_string()),
        "mode" => PanelInput::Mode(
            SubcategoryMode::from_str(require_arg()?, true).map_err(|e| anyhow!(e))?,
        ),
        "clear" => PanelInput::Clear,
        "reload" => PanelInput::Reload,
        "status" => PanelInput::Status,
        "help" | "h" | "?" => PanelInput::Help,
        "quit" | "q" | "exit" => PanelInput::Quit,
        other => bail!("unknown panel command ':{other}' (try :help)"),
    })
}

pub async fn run(ctx: &RuntimeContext) -> Result<()> {
    let mut store = load_store(ctx)?;
    let mut state = PanelState::new();
    let mut activity = SearchActivity::new(ctx.settle_delay()?);

    let mut searching = activity.subscribe();
    let indicator = tokio::spawn(async move {
        while searching.changed().await.is_ok() {
            if *searching.borrow_and_update() {
                log::info!("Searching...");
            } else {
                log::info!("Search settled");
            }
        }
    });

    println!("{HELP}");
    render(ctx, &state, &store).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}", prompt(&state));
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let input = match parse_input(&line) {
            Ok(input) => input,
            Err(err) => {
                eprintln!("{err:#}");
                continue;
            }
        };

        match input {
            PanelInput::Quit => break,
            PanelInput::Help => {
                println!("{HELP}");
                continue;
            }
            PanelInput::Status => {
                print_status(&state, &store, &activity);
                continue;
            }
            PanelInput::Search(term) => {
                activity.notify(&term);
                state.set_search(&term);
            }
            PanelInput::Clear => {
                activity.notify("");
                state.clear_search();
            }
            PanelInput::Category(category) => state.set_category(category),
            PanelInput::Subcategory(key) => state.select_subcategory(&key),
            PanelInput::Mode(mode) => state.set_mode(mode),
            PanelInput::Reload => match store.reload() {
                Ok(()) => println!(
                    "Reloaded {} entities (revision {})",
                    store.catalog().len(),
                    store.revision()
                ),
                Err(err) => {
                    eprintln!("Reload failed: {err:#}");
                    continue;
                }
            },
            PanelInput::Refresh => {}
        }

        render(ctx, &state, &store).await?;
    }

    drop(activity);
    indicator.abort();
    Ok(())
}

fn prompt(state: &PanelState) -> String {
    if state.is_search_active() {
        return "dashq [search]> ".to_string();
    }
    let by_area = if state.mode() == SubcategoryMode::Areas {
        " by area"
    } else {
        ""
    };
    format!(
        "dashq [{}/{}{by_area}]> ",
        state.category(),
        state.selected_subcategory()
    )
}

fn print_status(state: &PanelState, store: &CatalogStore, activity: &SearchActivity) {
    println!("Category:  {}", state.category());
    println!("Chip:      {}", state.selected_subcategory());
    println!(
        "Search:    {}",
        if state.is_search_active() {
            state.search_term().trim()
        } else {
            "-"
        }
    );
    println!("Searching: {}", activity.is_searching());
    println!(
        "Catalog:   {} entities, revision {}, threshold {}",
        store.catalog().len(),
        store.revision(),
        store.index().options().threshold
    );
}

async fn current_view(
    ctx: &RuntimeContext,
    state: &PanelState,
    store: &CatalogStore,
) -> PanelView {
    if state.is_search_active() && ctx.config.search.offload {
        let results = worker::spawn_search(store.shared_index(), state.search_term())
            .wait()
            .await;
        return PanelView::Search {
            term: state.search_term().trim().to_string(),
            total: results.len(),
            groups: group_results(results),
        };
    }
    state.view(store.index())
}

async fn render(ctx: &RuntimeContext, state: &PanelState, store: &CatalogStore) -> Result<()> {
    let view = current_view(ctx, state, store).await;

    output_for_format(ctx, &view, || match &view {
        PanelView::Search { term, total, groups } => {
            println!("Search '{term}': {total} result(s)");
            print_groups(ctx, groups)
        }
        PanelView::Browse {
            category,
            mode,
            selected,
            counts,
            entities,
        } => {
            let mode = match mode {
                SubcategoryMode::Categories => "categories",
                SubcategoryMode::Areas => "areas",
            };
            println!("{category} / {selected} (by {mode})");
            print_counts(ctx, counts, selected)?;
            let rows: Vec<EntityRow> = entities.iter().map(EntityRow::from).collect();
            print_table_or_empty(ctx, &rows, "Nothing here")
        }
    })
}
