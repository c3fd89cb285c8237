//! Search command implementation

use anyhow::Result;

use crate::commands::{limit_groups, load_store, print_groups};
use crate::config::RuntimeContext;
use crate::output::output_for_format;
use crate::panel::{group_results, PanelView};
use crate::worker;

pub async fn run(
    ctx: &RuntimeContext,
    term: &str,
    limit: Option<usize>,
    background: bool,
) -> Result<()> {
    let store = load_store(ctx)?;

    let results = if background || ctx.config.search.offload {
        let pending = worker::spawn_search(store.shared_index(), term);
        log::debug!(
            "Searching for '{term}' ({})",
            if pending.is_background() {
                "background"
            } else {
                "inline"
            }
        );
        pending.wait().await
    } else {
        store.index().search(term)
    };

    let total = results.len();
    let mut groups = group_results(results);
    limit_groups(&mut groups, limit);

    let view = PanelView::Search {
        term: term.trim().to_string(),
        total,
        groups,
    };

    output_for_format(ctx, &view, || {
        let PanelView::Search { groups, .. } = &view else {
            return Ok(());
        };
        if total == 0 {
            println!("No entities match '{}'", term.trim());
            return Ok(());
        }
        print_groups(ctx, groups)
    })
}
