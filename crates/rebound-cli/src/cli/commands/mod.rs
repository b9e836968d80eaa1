use super::args::*;
use rebound_core::config::{self, HarnessConfig};
use rebound_core::dataset;
use rebound_core::db::Database;
use rebound_core::engine::runner::Runner;
use rebound_core::errors::ConfigError;
use rebound_core::providers::llm::{anthropic::AnthropicClient, fake::FakeClient, LlmClient};
use rebound_core::report;
use std::sync::Arc;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => cmd_run(args).await,
        Command::Schema(args) => cmd_schema(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

async fn cmd_run(args: RunArgs) -> anyhow::Result<i32> {
    let cfg = match resolve_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let client = match build_client(&args, &cfg) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    tracing::info!(
        event = "run_start",
        db = %cfg.db.display(),
        dataset = %cfg.dataset.display(),
        provider = %args.provider,
        model = %cfg.model,
    );

    // Database-unavailable and a bad dataset are the only fatal paths.
    let db = Database::open_read_only(&cfg.db)?;
    let pool = dataset::load_dataset(&cfg.dataset).map_err(|e| anyhow::anyhow!(e))?;

    let runner = Runner::new(db, client, cfg)?;
    let artifacts = runner.run_batch(&pool).await;

    report::console::print_summary(&artifacts.summary, &artifacts.results, args.show_rows);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&artifacts.results)?);
    }

    // Mismatches are reported in-band; the exit code only reflects that the
    // batch ran to completion.
    Ok(exit_codes::OK)
}

fn cmd_schema(args: SchemaArgs) -> anyhow::Result<i32> {
    let db = Database::open_read_only(&args.db)?;
    print!("{}", db.describe_schema()?);
    Ok(exit_codes::OK)
}

fn resolve_config(args: &RunArgs) -> Result<HarnessConfig, ConfigError> {
    let mut cfg = match &args.config {
        Some(path) => config::load_config(path)?,
        None => HarnessConfig::with_paths(
            "nba_database.sqlite".into(),
            "ground_truth_data.json".into(),
        ),
    };

    // Flags win over file values.
    if let Some(db) = &args.db {
        cfg.db = db.clone();
    }
    if let Some(dataset) = &args.dataset {
        cfg.dataset = dataset.clone();
    }
    if let Some(n) = args.num_examples {
        cfg.num_examples = n;
    }
    if args.no_feedback {
        cfg.feedback = false;
    }
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    if let Some(model) = &args.model {
        cfg.model = model.clone();
    }
    if let Some(t) = args.timeout_seconds {
        cfg.timeout_seconds = t;
    }

    config::validate(&cfg)?;
    Ok(cfg)
}

fn build_client(args: &RunArgs, cfg: &HarnessConfig) -> Result<Arc<dyn LlmClient>, ConfigError> {
    match args.provider.as_str() {
        "anthropic" => {
            let api_key = args.api_key.clone().ok_or_else(|| {
                ConfigError("missing API key (set ANTHROPIC_API_KEY or pass --api-key)".into())
            })?;
            Ok(Arc::new(AnthropicClient::new(
                cfg.model.clone(),
                api_key,
                cfg.max_tokens,
            )))
        }
        "fake" => {
            if args.fake_reply.is_empty() {
                return Err(ConfigError(
                    "fake provider needs at least one --fake-reply".into(),
                ));
            }
            Ok(Arc::new(FakeClient::new(args.fake_reply.clone())))
        }
        other => Err(ConfigError(format!(
            "unknown provider '{}' (expected anthropic|fake)",
            other
        ))),
    }
}
