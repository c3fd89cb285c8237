//! Category browsing commands (list, counts)

use anyhow::Result;

use crate::category::{Category, SubcategoryCounts, SubcategoryMode, ALL};
use crate::commands::{load_store, print_counts, print_table_or_empty, EntityRow};
use crate::config::RuntimeContext;
use crate::output::output_for_format;
use crate::panel::{PanelState, PanelView};

fn mode_for(by_area: bool) -> SubcategoryMode {
    if by_area {
        SubcategoryMode::Areas
    } else {
        SubcategoryMode::Categories
    }
}

pub fn list(
    ctx: &RuntimeContext,
    category: Category,
    subcategory: &str,
    by_area: bool,
) -> Result<()> {
    let store = load_store(ctx)?;

    let mut state = PanelState::new();
    state.set_category(category);
    state.set_mode(mode_for(by_area));
    state.select_subcategory(subcategory);

    let view = state.view(store.index());
    let PanelView::Browse {
        counts, entities, ..
    } = &view
    else {
        return Ok(());
    };

    if subcategory != ALL && counts.get(subcategory).is_none() {
        log::warn!(
            "No '{subcategory}' subcategory in {category} (available: {})",
            counts.keys().collect::<Vec<_>>().join(", ")
        );
    }

    output_for_format(ctx, &view, || {
        let rows: Vec<EntityRow> = entities.iter().map(EntityRow::from).collect();
        print_table_or_empty(ctx, &rows, &format!("No {category} in '{subcategory}'"))
    })
}

pub fn counts(ctx: &RuntimeContext, category: Category, by_area: bool) -> Result<()> {
    let store = load_store(ctx)?;
    let counts = SubcategoryCounts::compute(
        store
            .catalog()
            .entities()
            .iter()
            .filter(|e| category.contains(e)),
        mode_for(by_area),
    );

    output_for_format(ctx, &counts, || print_counts(ctx, &counts, ALL))
}
