use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rowcache",
    version,
    about = "Page through forward-only tables with a sliding window cache"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show table name, columns and the total row count
    Info(InfoArgs),
    /// Print a window of rows
    Page(PageArgs),
    /// Walk the whole table page by page
    Scan(ScanArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SourceArgs {
    /// JSON Lines file, one object per row
    pub file: PathBuf,

    /// Field holding the row key (default: Row<n>)
    #[arg(long)]
    pub key_field: Option<String>,

    /// Cache config file (YAML)
    #[arg(long, env = "ROWCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the configured cache size
    #[arg(long)]
    pub cache_size: Option<usize>,

    /// Override the configured look-ahead
    #[arg(long)]
    pub look_ahead: Option<usize>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::Args, Debug, Clone)]
pub struct InfoArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug, Clone)]
pub struct PageArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Index of the first row
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Number of rows
    #[arg(long, default_value_t = 20)]
    pub length: usize,

    /// Only show these columns (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ScanArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Rows per page (capped to the largest window the cache can serve)
    #[arg(long, default_value_t = 100)]
    pub page_size: usize,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}
