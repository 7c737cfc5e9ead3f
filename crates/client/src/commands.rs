// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Command implementations for the `mirra` binary.

use std::path::Path;

use mirra_core::record::ID_KEY;
use mirra_core::{parse_filter, Record, SortSpec};
use serde_json::Value;
use tracing::{info, warn};

use crate::channel::WebSocketTransport;
use crate::cli::{Cli, Command, OutputFormat, ServerArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::live_list::LiveList;
use crate::runtime::Runtime;

/// Runs one parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Watch { kind, filter, sort, once, output, server } => {
            let config = load_config(cli.config.as_deref(), &server)?;
            watch(config, &kind, &filter, &sort, once, output).await
        }
        Command::Get { kind, id, server } => {
            let config = load_config(cli.config.as_deref(), &server)?;
            get(config, &kind, &id).await
        }
        Command::Config => {
            let config = load_config(cli.config.as_deref(), &ServerArgs::default())?;
            let text = toml::to_string_pretty(&config)
                .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
            print!("{text}");
            Ok(())
        }
    }
}

/// Loads the config file and applies command-line overrides.
pub fn load_config(path: Option<&Path>, server: &ServerArgs) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load(path)?,
        None => Config::discover()?,
    };
    if let Some(url) = &server.base_url {
        config.server.base_url = url.clone();
    }
    if let Some(url) = &server.push_url {
        config.server.push_url = url.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn watch(config: Config, kind: &str, filter: &str, sort: &str, once: bool, output: OutputFormat) -> Result<()> {
    let filter = parse_filter(filter)?;
    let sort = SortSpec::parse(sort)?;

    let mut runtime = Runtime::from_config(config)?;
    runtime.register_rest_kind(kind)?;
    let list = LiveList::open(runtime.store(), kind, filter, sort).await?;
    println!("{}", format_records(&list.records(), output)?);
    if once {
        return Ok(());
    }

    list.on_change(move |records| match format_records(records, output) {
        Ok(text) => println!("{text}"),
        Err(e) => warn!(error = %e, "failed to print records"),
    });
    runtime.connect(WebSocketTransport::default());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = runtime.next_batch() => {}
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }
        }
    }
    runtime.disconnect();
    Ok(())
}

async fn get(config: Config, kind: &str, id: &str) -> Result<()> {
    let runtime = Runtime::from_config(config)?;
    runtime.register_rest_kind(kind)?;
    let adapter = runtime.store().adapter(kind)?;
    let Some(mut data) = adapter.read_one(kind, id).await? else {
        return Err(Error::NotFound { kind: kind.to_string(), id: id.to_string() });
    };
    data.entry(ID_KEY).or_insert_with(|| Value::String(id.to_string()));
    let entity = runtime.store().materialize(kind, &data)?;
    println!("{}", serde_json::to_string_pretty(&entity.snapshot())?);
    Ok(())
}

/// Renders records for the terminal.
pub fn format_records(records: &[Record], output: OutputFormat) -> Result<String> {
    match output {
        OutputFormat::Json => Ok(serde_json::to_string(records)?),
        OutputFormat::Text => {
            if records.is_empty() {
                return Ok("(empty)".to_string());
            }
            let mut lines = Vec::with_capacity(records.len());
            for record in records {
                lines.push(format!("{}  {}", record.id, serde_json::to_string(&record.fields)?));
            }
            Ok(lines.join("\n"))
        }
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
