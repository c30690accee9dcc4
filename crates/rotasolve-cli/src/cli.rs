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
    version,
    about = "rotasolve CLI - find the lowest-energy rotamer states of a tabulated energy problem with dead-end elimination, mean-field relaxation, Monte Carlo and enumeration.",
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
    /// Search a tabulated problem for its lowest-energy states.
    Solve(SolveArgs),
    /// Print the per-term energy summary of one state.
    Energy(EnergyArgs),
}

/// Arguments for the `solve` subcommand.
#[derive(Args, Debug)]
pub struct SolveArgs {
    // --- Core Arguments ---
    /// Path to the tabulated energy problem in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub problem: PathBuf,

    /// Path to the optimizer configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the ranked states as CSV to this path instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    // --- Stage Overrides ---
    /// Disable dead-end elimination.
    #[arg(long)]
    pub no_dee: bool,

    /// Disable exhaustive enumeration.
    #[arg(long)]
    pub no_enum: bool,

    /// Disable the self-consistent mean field stage.
    #[arg(long)]
    pub no_scmf: bool,

    /// Disable Monte Carlo annealing.
    #[arg(long)]
    pub no_mc: bool,

    // --- Result Overrides ---
    /// Override the random seed (0 selects a time-based seed).
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Override the number of states to keep.
    #[arg(short, long, value_name = "INT")]
    pub num_solutions: Option<usize>,

    /// Prune rotamers whose self energy exceeds the position's best by this margin.
    #[arg(long, value_name = "FLOAT")]
    pub self_energy_cutoff: Option<f64>,

    /// Keep per-term tables and print the breakdown of the best state.
    #[arg(long)]
    pub by_term: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S monte-carlo.cycles=5000
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `energy` subcommand.
#[derive(Args, Debug)]
pub struct EnergyArgs {
    /// Path to the tabulated energy problem in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub problem: PathBuf,

    /// Flat rotamer index per position, comma separated (e.g. 0,2,1).
    #[arg(short, long, required = true, value_delimiter = ',', value_name = "INDICES")]
    pub state: Vec<usize>,
}
