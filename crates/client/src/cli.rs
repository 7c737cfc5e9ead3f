// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// How records are printed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One `id  {fields}` line per record.
    #[default]
    Text,
    /// One JSON array per update.
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "mirra")]
#[command(about = "Live view of server collections kept in sync over a push channel")]
#[command(version)]
pub struct Cli {
    /// Path to mirra.toml (default: nearest one above the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Server endpoints that override the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct ServerArgs {
    /// REST base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Push channel URL
    #[arg(long)]
    pub push_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a live list and print it every time it changes
    Watch {
        /// Kind to watch (e.g. persons)
        kind: String,

        /// Filter as JSON (e.g. '{"age": [18, 65]}')
        #[arg(short, long, default_value = "")]
        filter: String,

        /// Sort as JSON (e.g. '{"name": "asc"}')
        #[arg(short, long, default_value = "")]
        sort: String,

        /// Print the initial list and exit without connecting
        #[arg(long)]
        once: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,

        #[command(flatten)]
        server: ServerArgs,
    },

    /// Read one record from the server
    Get {
        kind: String,
        id: String,

        #[command(flatten)]
        server: ServerArgs,
    },

    /// Print the effective configuration
    Config,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
