//! `dashq config` subcommands

use anyhow::{anyhow, Context, Result};
use serde_json::Value;

use crate::cli::ConfigCommand;
use crate::config::{write_default_config, AppConfig, RuntimeContext};
use crate::output::output_for_format;

pub fn run(ctx: &RuntimeContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => show(ctx),
        ConfigCommand::Path => {
            println!("{}", ctx.config_path().display());
            Ok(())
        }
        ConfigCommand::Get { key: Some(key) } => {
            println!("{}", lookup(&ctx.config, &key)?);
            Ok(())
        }
        ConfigCommand::Get { key: None } => show(ctx),
        ConfigCommand::Reset => {
            write_default_config(ctx.config_path())?;
            println!("Wrote default configuration to {}", ctx.config_path().display());
            Ok(())
        }
    }
}

/// Print the merged configuration; tables render as TOML
fn show(ctx: &RuntimeContext) -> Result<()> {
    output_for_format(ctx, &ctx.config, || {
        let toml = toml::to_string_pretty(&ctx.config).context("rendering configuration")?;
        print!("{toml}");
        Ok(())
    })
}

/// Resolve a dotted key such as `search.weights.name`
fn lookup(config: &AppConfig, key: &str) -> Result<String> {
    let tree = serde_json::to_value(config)?;
    let pointer = format!("/{}", key.replace('.', "/"));

    let value = tree
        .pointer(&pointer)
        .ok_or_else(|| anyhow!("no configuration key '{key}'"))?;

    Ok(match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    })
}
