//! Entity detail command

use anyhow::{bail, Result};
use serde::Serialize;
use serde_json::Value;

use crate::category::{subcategory_of, Category, SubcategoryMode};
use crate::commands::load_store;
use crate::config::RuntimeContext;
use crate::entity::Entity;
use crate::output::output_for_format;
use crate::translate::{device_class_label, domain_label, format_value, state_label};

#[derive(Debug, Serialize)]
struct EntityDetail<'a> {
    #[serde(flatten)]
    entity: &'a Entity,
    category: Category,
    subcategory: Option<&'a str>,
    label: String,
    active: bool,
}

pub fn run(ctx: &RuntimeContext, entity_id: &str) -> Result<()> {
    let store = load_store(ctx)?;

    let Some(entity) = store.catalog().get(entity_id) else {
        let close: Vec<String> = store
            .index()
            .search(entity_id)
            .into_iter()
            .take(3)
            .map(|r| r.entity.id)
            .collect();
        if close.is_empty() {
            bail!("Entity not found: {entity_id}");
        }
        bail!(
            "Entity not found: {entity_id} (did you mean {}?)",
            close.join(", ")
        );
    };

    let detail = EntityDetail {
        entity,
        category: Category::of(entity),
        subcategory: subcategory_of(entity, SubcategoryMode::Categories),
        label: state_label(entity),
        active: entity.is_active(),
    };

    output_for_format(ctx, &detail, || {
        println!("Entity:   {}", entity.id);
        println!("Name:     {}", entity.name);
        println!("Domain:   {}", domain_label(&entity.domain));
        println!(
            "Category: {}{}",
            detail.category,
            detail
                .subcategory
                .map(|s| format!(" / {s}"))
                .unwrap_or_default()
        );
        println!("Area:     {}", entity.area().unwrap_or("-"));
        println!(
            "State:    {}{}",
            detail.label,
            if detail.active { " (active)" } else { "" }
        );
        if let Some(class) = entity.attributes.device_class() {
            println!("Class:    {}", device_class_label(class));
        }
        if let Some(current) = entity.attributes.current_temperature() {
            println!("Current:  {}", format_value(current, Some("°C")));
        }
        if let Some(target) = entity.attributes.temperature() {
            println!("Target:   {}", format_value(target, Some("°C")));
        }
        if let Some(position) = entity.attributes.current_position() {
            println!("Position: {}", format_value(position, Some("%")));
        }
        if let Some(icon) = entity.attributes.icon() {
            println!("Icon:     {icon}");
        }

        if !entity.attributes.is_empty() {
            println!();
            println!("Attributes:");
            for (key, value) in entity.attributes.iter() {
                match value {
                    Value::String(s) => println!("  {key}: {s}"),
                    other => println!("  {key}: {other}"),
                }
            }
        }
        Ok(())
    })
}
