use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "weather-journal", version, about = "Weather lookups with a local journal.")]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Journal API base URL, overrides the configured one
    #[arg(long, global = true)]
    pub api_base: Option<String>,
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the journal API server
    Serve,
    /// Look up the weather for a place and store it
    Search(SearchArgs),
    /// List stored queries, newest first
    List,
    /// Show one query with its theme and tips
    Show { id: u64 },
    /// Change a stored query and refresh its forecast
    Update(UpdateArgs),
    /// Delete a stored query
    Delete { id: u64 },
    /// Export every stored query
    Export(ExportArgs),
    /// Name the place at the given coordinates
    Locate {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Theme and tips for a summary text, without a server
    Analyze { text: String },
}

#[derive(Debug, Parser)]
pub struct SearchArgs {
    #[arg(long, default_value = "")]
    pub location: String,
    /// Start date (inclusive)
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// End date (inclusive)
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Parser)]
pub struct UpdateArgs {
    pub id: u64,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub start: Option<NaiveDate>,
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Parser)]
pub struct ExportArgs {
    /// json, csv, xml or md
    #[arg(long, default_value = "json")]
    pub format: String,
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
