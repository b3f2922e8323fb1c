//! `sinkhole config` - read and change settings.

use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use sinkhole_config::item::ITEMS;
use sinkhole_config::{ApplyMode, ConfigError, SetOutcome, Value};

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};

pub async fn execute(ctx: Context, args: ConfigArgs) -> Result<ExitCode> {
    match args.command {
        ConfigCommands::Get { key, quiet } => get(&ctx, &key, quiet),
        ConfigCommands::Set { key, value } => set(&ctx, &key, &value),
        ConfigCommands::Show { json, modified } => show(&ctx, json, modified),
        ConfigCommands::Keys => keys(),
        ConfigCommands::Write => write(&ctx),
        ConfigCommands::Path => {
            println!("{}", ctx.config_path.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Report a rejected key or value and turn it into its exit code.
fn user_error(err: ConfigError) -> Result<ExitCode> {
    if !err.is_user_error() {
        return Err(err.into());
    }
    eprintln!("{} {err}", "Error:".red().bold());
    if let ConfigError::UnknownKey(_) = err {
        eprintln!("Run `sinkhole config keys` for the list of known keys.");
    }
    Ok(exit_code(err.exit_code()))
}

fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}

fn get(ctx: &Context, key: &str, quiet: bool) -> Result<ExitCode> {
    let (_, value) = match ctx.store.get(key) {
        Ok(found) => found,
        Err(e) => return user_error(e),
    };

    if quiet {
        if let Value::Bool(flag) = value {
            return Ok(if flag { ExitCode::SUCCESS } else { ExitCode::from(1) });
        }
    }
    println!("{value}");
    Ok(ExitCode::SUCCESS)
}

fn set(ctx: &Context, key: &str, text: &str) -> Result<ExitCode> {
    let outcome = match ctx.store.set_from_text(key, text) {
        Ok(outcome) => outcome,
        Err(e) => return user_error(e),
    };

    if let SetOutcome::Changed { apply, .. } = &outcome {
        ctx.store.persist(&ctx.config_path)?;
        match apply {
            ApplyMode::Live => {}
            ApplyMode::RestartResolver => {
                eprintln!("{} resolver restart needed to apply {key}", "Note:".yellow().bold());
            }
            ApplyMode::RestartRequired => {
                eprintln!("{} {key} takes effect after a restart", "Note:".yellow().bold());
            }
        }
    }
    println!("{}", outcome.value());
    Ok(ExitCode::SUCCESS)
}

fn show(ctx: &Context, json: bool, modified: bool) -> Result<ExitCode> {
    let settings = ctx.store.snapshot();

    if json {
        println!("{}", serde_json::to_string_pretty(&*settings)?);
        return Ok(ExitCode::SUCCESS);
    }

    for item in ITEMS {
        let value = item.value(&settings);
        let changed = value != item.default_value();
        if modified && !changed {
            continue;
        }
        if changed {
            println!("{} = {} {}", item.key.bold(), value, "(modified)".dimmed());
        } else {
            println!("{} = {}", item.key.bold(), value);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn keys() -> Result<ExitCode> {
    for item in ITEMS {
        print!("{}  {}", item.key.bold(), item.kind.type_name().cyan());
        if let Some(allowed) = item.kind.allowed() {
            print!("  [{allowed}]");
        }
        println!();
        println!("    {}", item.description.dimmed());
    }
    Ok(ExitCode::SUCCESS)
}

fn write(ctx: &Context) -> Result<ExitCode> {
    ctx.store.persist(&ctx.config_path)?;
    if ctx.verbose > 0 {
        eprintln!("{} wrote {}", "Success:".green().bold(), ctx.config_path.display());
    }
    Ok(ExitCode::SUCCESS)
}
