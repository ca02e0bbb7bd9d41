use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "LatticeLab Developers",
    version,
    about = "LatticeLab CLI - Run atom, bond, metallic-cloud and crystal scenes headlessly and report their structure.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a scene, advance it for a number of frames and print statistics.
    Simulate(SimulateArgs),
    /// List the element table, or show one element in detail.
    Elements(ElementsArgs),
}

/// Arguments for the `simulate` subcommand.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Path to the scene description in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub scene: PathBuf,

    /// Path to a run configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the element table with a TOML file.
    #[arg(short, long, value_name = "PATH")]
    pub elements: Option<PathBuf>,

    /// Number of frames to advance.
    #[arg(short = 'n', long, value_name = "INT")]
    pub frames: Option<u64>,

    /// Physics mode preset ('pedagogical' or 'realistic').
    #[arg(short, long, value_name = "MODE")]
    pub mode: Option<String>,

    /// Seed for the metallic-cloud electron animation.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Disable gravity, overriding the config file.
    #[arg(long)]
    pub no_gravity: bool,

    /// Enable Van der Waals attraction regardless of the mode preset.
    #[arg(long)]
    pub vdw: bool,

    /// Do not draw a progress bar.
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the `elements` subcommand.
#[derive(Args, Debug)]
pub struct ElementsArgs {
    /// Element symbol to describe. Lists every element when omitted.
    #[arg(value_name = "SYMBOL")]
    pub symbol: Option<String>,

    /// Read the element table from a TOML file instead of the built-in one.
    #[arg(short, long, value_name = "PATH")]
    pub elements: Option<PathBuf>,
}
