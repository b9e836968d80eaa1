use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rebound",
    version,
    about = "NL-to-SQL evaluation harness with one-shot feedback"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a batch of test cases against the model
    Run(RunArgs),
    /// Print the schema description used in prompts
    Schema(SchemaArgs),
    Version,
}

#[derive(Parser, Clone)]
pub struct RunArgs {
    /// Optional YAML harness config; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// SQLite database file (opened read-only)
    /// [default: nba_database.sqlite]
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Ground-truth JSON dataset
    /// [default: ground_truth_data.json]
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Number of test cases to sample
    #[arg(long)]
    pub num_examples: Option<usize>,

    /// Disable the one-shot feedback re-prompt
    #[arg(long)]
    pub no_feedback: bool,

    /// Sampler seed (same seed reproduces the same subset)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// Model provider: anthropic | fake
    #[arg(long, default_value = "anthropic")]
    pub provider: String,

    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Per-call model timeout in seconds
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// Scripted replies for the fake provider (repeatable, raw reply text)
    #[arg(long)]
    pub fake_reply: Vec<String>,

    /// Show expected vs. actual rows for failed cases
    #[arg(long)]
    pub show_rows: bool,

    /// Write per-case results as JSON to stdout in addition to the report
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Clone)]
pub struct SchemaArgs {
    #[arg(long, default_value = "nba_database.sqlite")]
    pub db: PathBuf,
}
