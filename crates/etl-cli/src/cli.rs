//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "customer-etl",
    version,
    about = "Customer export pipeline",
    long_about = "Fetch each customer's latest export, normalize and validate it,\n\
                  store accepted rows and publish a data file plus a report."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Application config file (default: ./customer-etl.toml when present).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Directory with main_config.json and customer_config/.
    #[arg(long = "config-dir", value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Root of the per-customer source containers.
    #[arg(long = "source-root", value_name = "DIR", global = true)]
    pub source_root: Option<PathBuf>,

    /// Root of the per-customer destination containers.
    #[arg(long = "artifact-root", value_name = "DIR", global = true)]
    pub artifact_root: Option<PathBuf>,

    /// SQLite database file.
    #[arg(long = "database", value_name = "PATH", global = true)]
    pub database: Option<PathBuf>,

    /// Customers processed in parallel.
    #[arg(long = "workers", value_name = "N", global = true)]
    pub workers: Option<usize>,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format.
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow row values in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Process customers: all of them, or the ones given with --names.
    Run(RunArgs),

    /// List configured customers and their resolved columns.
    Customers(CustomersArgs),

    /// Serve the manual-run HTTP API.
    Serve(ServeArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Comma-separated customer names (manual run).
    #[arg(long = "names", value_name = "NAMES")]
    pub names: Option<String>,

    /// Print results as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct CustomersArgs {
    /// Print the configuration summary as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct ServeArgs {
    /// Listen address (overrides server.bind).
    #[arg(long = "bind", value_name = "ADDR")]
    pub bind: Option<String>,

    /// Answer unknown names with the bare `invalid_name` text.
    #[arg(long = "plain-text-errors")]
    pub plain_text_errors: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
