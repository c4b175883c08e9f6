//! `maker` - command-line entry point driving the orchestrator to completion.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use comfy_table::{Cell, ContentArrangement, Table};
use futures::StreamExt;

use maker::events::Event;
use maker::models::{TaskConfig, VotingStrategy};
use maker::orchestrator::Orchestrator;
use maker::registry::ToolRegistry;
use maker::yaml_repair::UnimplementedRepairer;

/// Plan, validate, and execute a natural-language task through a swarm of
/// voting agents.
#[derive(Parser)]
#[command(name = "maker")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The task instruction to run.
    instruction: String,

    /// Voting strategy: none, majority, or first_to_k.
    #[arg(long = "voting", default_value = "none")]
    voting_strategy: String,

    /// Model name passed through to every agent request.
    #[arg(long)]
    model: Option<String>,

    /// Target number of valid samples before a majority is checked for.
    #[arg(long)]
    voting_n: Option<usize>,

    /// Lead threshold for the first-to-k voting strategy.
    #[arg(long)]
    voting_k: Option<usize>,

    /// Hard cap on samples taken in one voting round.
    #[arg(long)]
    max_voting_samples: Option<usize>,

    /// Run the informational quality checks alongside validation.
    #[arg(long)]
    quality_checks: bool,

    /// Optional TOML/YAML/JSON file with `TaskConfig` overrides, layered
    /// under CLI flags and the `MAKER_` environment prefix.
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Print every event as it's emitted instead of just the final result.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(run(config, cli.verbose))
}

/// Merges CLI flags over a config file (if given) over `MAKER_`-prefixed
/// environment variables, following the `config` crate's layered-source
/// convention.
fn load_config(cli: &Cli) -> Result<TaskConfig, Box<dyn std::error::Error>> {
    let mut builder =
        config::Config::builder().add_source(config::Environment::with_prefix("MAKER"));
    if let Some(path) = &cli.config {
        builder = builder.add_source(config::File::from(path.clone()));
    }
    let mut layered = builder.build()?.try_deserialize::<TaskConfig>().unwrap_or_else(|_| {
        TaskConfig::builder(cli.instruction.as_str())
            .build()
            .expect("default instruction and strategy always build")
    });

    layered.instruction = cli.instruction.clone();
    if let Some(model) = &cli.model {
        layered.model_name = model.clone();
    }
    layered.voting_strategy = match cli.voting_strategy.as_str() {
        "none" => VotingStrategy::None,
        "majority" => VotingStrategy::Majority,
        "first_to_k" => VotingStrategy::FirstToK,
        other => return Err(format!("unknown voting strategy '{other}'").into()),
    };
    if let Some(voting_n) = cli.voting_n {
        layered.voting_n = voting_n;
    }
    if let Some(voting_k) = cli.voting_k {
        layered.voting_k = voting_k;
    }
    if let Some(max_voting_samples) = cli.max_voting_samples {
        layered.max_voting_samples = max_voting_samples;
    }
    if cli.quality_checks {
        layered.enable_quality_checks = true;
    }
    layered.validate()?;
    Ok(layered)
}

async fn run(config: TaskConfig, verbose: bool) -> ExitCode {
    let registry = Arc::new(ToolRegistry::with_defaults());
    let client = Arc::new(UnconfiguredClient);
    let repairer = Arc::new(UnimplementedRepairer);

    let orchestrator = Orchestrator::new(config, registry, client, repairer);
    let stream = orchestrator.run();
    futures::pin_mut!(stream);

    let mut outcome = ExitCode::FAILURE;
    while let Some(event) = stream.next().await {
        if verbose {
            print_event(&event);
        }
        match event {
            Event::TaskCompleted { result, total_cost_usd, total_duration_ms, .. } => {
                print_summary(&result, total_cost_usd, total_duration_ms);
                outcome = ExitCode::SUCCESS;
            }
            Event::TaskFailed { error, step, .. } => {
                eprintln!("task failed at step {step}: {error}");
                outcome = ExitCode::FAILURE;
            }
            _ => {}
        }
    }
    outcome
}

fn print_event(event: &Event) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => log::warn!("failed to serialize event: {e}"),
    }
}

fn print_summary(result: &serde_json::Value, total_cost_usd: f64, total_duration_ms: u64) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![Cell::new("step"), Cell::new("title"), Cell::new("cost_usd")]);

    if let Some(steps) = result.get("steps").and_then(serde_json::Value::as_array) {
        for step in steps {
            table.add_row(vec![
                step.get("step").map(ToString::to_string).unwrap_or_default(),
                step.get("title")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                step.get("cost_usd").map(ToString::to_string).unwrap_or_default(),
            ]);
        }
    }

    println!("{table}");
    println!("total cost: ${total_cost_usd:.4}, total duration: {total_duration_ms}ms");
}

/// Placeholder [`maker::agent_runner::AgentClient`]: the actual model/tool
/// client is an external collaborator out of this crate's scope, so the
/// binary fails loudly rather than pretending to talk to one.
struct UnconfiguredClient;

#[async_trait::async_trait]
impl maker::agent_runner::AgentClient for UnconfiguredClient {
    async fn run(
        &self,
        _request: maker::agent_runner::AgentRequest,
    ) -> futures::stream::BoxStream<'static, maker::agent_runner::AgentMessage> {
        log::error!("no AgentClient configured; wire one in before running tasks for real");
        Box::pin(futures::stream::empty())
    }
}
