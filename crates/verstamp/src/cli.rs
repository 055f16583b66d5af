use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use simplelog::LevelFilter;
use verstamp_core::Environment;
use verstamp_inject::{BuildMode, BuildTarget};

#[derive(Parser, Debug)]
#[command(name = "verstamp")]
#[command(about = "Stamp build output with its version and watch for newer deployments")]
#[command(version)]
pub struct Cli {
    /// Log level
    #[arg(
        short = 'l',
        long = "log-level",
        value_name = "LEVEL",
        value_enum,
        default_value = "info",
        global = true
    )]
    pub log_level: LogLevel,

    /// Also append log lines to this file
    #[arg(long = "log-file", value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Insert the version marker into an HTML file and write version.json
    Stamp(StampArgs),
    /// Compare the running version with the one published at an endpoint
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct StampArgs {
    /// HTML entry document, rewritten in place
    #[arg(long, value_name = "FILE")]
    pub html: PathBuf,

    /// Version to stamp (defaults to the options file, else 1.0.0)
    #[arg(long = "app-version", value_name = "VERSION")]
    pub app_version: Option<String>,

    /// JSON injector options file
    #[arg(long, value_name = "FILE")]
    pub options: Option<PathBuf>,

    /// Directory for version.json (defaults to the HTML file's directory)
    #[arg(long = "out-dir", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Do not write version.json
    #[arg(long = "no-manifest")]
    pub no_manifest: bool,

    /// Mode of the current build
    #[arg(long, value_name = "MODE", default_value = "production")]
    pub mode: BuildMode,

    /// Build modes that get stamped: development, production or all
    #[arg(long, value_name = "TARGET")]
    pub target: Option<BuildTarget>,
}

#[derive(Args, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct CheckArgs {
    /// JSON check config file; flags override its values
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Endpoint serving {"version": "..."}
    #[arg(long = "api-url", value_name = "URL")]
    pub api_url: Option<String>,

    /// Version to compare against (defaults to the marker in --html)
    #[arg(long = "current-version", value_name = "VERSION")]
    pub current_version: Option<String>,

    /// HTML document carrying the embedded version marker
    #[arg(long, value_name = "FILE")]
    pub html: Option<PathBuf>,

    /// Keep checking until a new version is found or ctrl-c
    #[arg(long)]
    pub poll: bool,

    /// Milliseconds between polling cycles
    #[arg(long = "interval-ms", value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Consecutive failures before polling stops (0 = unlimited)
    #[arg(long = "max-retries", value_name = "N")]
    pub max_retries: Option<u32>,

    #[arg(long, value_enum, value_name = "ENV")]
    pub environment: Option<EnvironmentArg>,

    /// Emit lifecycle trace lines
    #[arg(long)]
    pub debug: bool,

    /// Never report new versions in development
    #[arg(long = "disable-dev-updates")]
    pub disable_dev_updates: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentArg {
    Development,
    Production,
}

impl From<EnvironmentArg> for Environment {
    fn from(value: EnvironmentArg) -> Self {
        match value {
            EnvironmentArg::Development => Environment::Development,
            EnvironmentArg::Production => Environment::Production,
        }
    }
}
