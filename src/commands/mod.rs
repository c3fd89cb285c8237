//! Command implementations

pub mod browse;
pub mod completions;
pub mod config;
pub mod panel;
pub mod query;
pub mod search;
pub mod show;
pub mod suggest;

use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;

use crate::catalog::{Catalog, CatalogStore};
use crate::category::SubcategoryCounts;
use crate::config::RuntimeContext;
use crate::entity::Entity;
use crate::fuzzy::SearchResult;
use crate::output::print_table;
use crate::panel::ResultGroup;
use crate::translate::state_label;

/// Load the configured catalog and index it with the configured options
pub(crate) fn load_store(ctx: &RuntimeContext) -> Result<CatalogStore> {
    let path = ctx.catalog_path()?;
    let catalog = Catalog::load(path.as_deref())?;
    log::debug!(
        "Loaded {} entities in {} domains from {}",
        catalog.len(),
        catalog.domains().len(),
        catalog
            .source()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "demo catalog".to_string())
    );
    Ok(CatalogStore::new(catalog, ctx.search_options()))
}

#[derive(Debug, Tabled, Serialize)]
pub(crate) struct EntityRow {
    #[tabled(rename = "ENTITY ID")]
    entity_id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "AREA")]
    area: String,
    #[tabled(rename = "STATE")]
    state: String,
}

impl From<&Entity> for EntityRow {
    fn from(entity: &Entity) -> Self {
        Self {
            entity_id: entity.id.clone(),
            name: entity.name.clone(),
            area: entity.area().unwrap_or("-").to_string(),
            state: state_label(entity),
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub(crate) struct ResultRow {
    #[tabled(rename = "ENTITY ID")]
    entity_id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "AREA")]
    area: String,
    #[tabled(rename = "STATE")]
    state: String,
    #[tabled(rename = "SCORE")]
    score: String,
    #[tabled(rename = "MATCHED")]
    matched: String,
}

impl From<&SearchResult> for ResultRow {
    fn from(result: &SearchResult) -> Self {
        let row = EntityRow::from(&result.entity);
        Self {
            entity_id: row.entity_id,
            name: row.name,
            area: row.area,
            state: row.state,
            score: format!("{:.3}", result.score),
            matched: result
                .matches
                .iter()
                .map(|m| m.field.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
struct CountRow {
    #[tabled(rename = "SEL")]
    marker: String,
    #[tabled(rename = "SUBCATEGORY")]
    key: String,
    #[tabled(rename = "COUNT")]
    count: usize,
    #[tabled(rename = "ACTIVE")]
    active: usize,
}

/// Print search hits one table per non-empty group
pub(crate) fn print_groups(ctx: &RuntimeContext, groups: &[ResultGroup]) -> Result<()> {
    for group in groups.iter().filter(|g| g.count > 0) {
        println!("{} ({})", capitalize(group.group.as_str()), group.count);
        let rows: Vec<ResultRow> = group.results.iter().map(ResultRow::from).collect();
        print_table(ctx, &rows)?;
        let hidden = group.count - group.results.len();
        if hidden > 0 {
            println!("  ... and {hidden} more");
        }
    }
    Ok(())
}

pub(crate) fn print_table_or_empty<T: Tabled>(
    ctx: &RuntimeContext,
    rows: &[T],
    empty: &str,
) -> Result<()> {
    if rows.is_empty() {
        println!("{empty}");
        Ok(())
    } else {
        print_table(ctx, rows)
    }
}

/// Print subcategory chips, marking the selected one
pub(crate) fn print_counts(
    ctx: &RuntimeContext,
    counts: &SubcategoryCounts,
    selected: &str,
) -> Result<()> {
    let rows: Vec<CountRow> = counts
        .entries
        .iter()
        .map(|(key, count)| CountRow {
            marker: if key == selected { "*" } else { "" }.to_string(),
            key: key.clone(),
            count: count.count,
            active: count.active_count,
        })
        .collect();
    print_table(ctx, &rows)
}

/// Keep at most `limit` results per group; counts still report the full size
pub(crate) fn limit_groups(groups: &mut [ResultGroup], limit: Option<usize>) {
    if let Some(limit) = limit {
        for group in groups {
            group.results.truncate(limit);
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
