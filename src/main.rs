// src/main.rs — tandem entry point

use clap::Parser;

use tandem::cli::{progress, Cli};
use tandem::core::types::StopReason;
use tandem::core::workflow::{RoleClient, Workflow};
use tandem::infra::config::{Config, EngineConfig};
use tandem::infra::logger;
use tandem::provider::resolver::{build_provider, Credentials};
use tandem::provider::ModelRef;
use tandem::report;

#[tokio::main]
async fn main() {
    // Respects RUST_LOG
    logger::init_logging("warn");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = if let Some(ref path) = cli.config {
        Config::load_from(path)?
    } else {
        Config::load()?
    };

    // CLI flags override the config file field-by-field
    if let Some(ref mode) = cli.budget_mode {
        config.workflow.budget_mode = mode.parse()?;
    }
    if let Some(n) = cli.max_iterations {
        config.workflow.max_iterations = Some(n);
    }

    let engine_config = EngineConfig::resolve(&config.workflow)?;
    let Some((kind, input)) = cli.command.resolve()? else {
        return Ok(());
    };

    // Build role clients from explicit credentials; no ambient globals
    let creds = Credentials::from_env();
    let manager_ref = parse_model(&config.models.manager.model)?;
    let developer_ref = parse_model(&config.models.developer.model)?;

    let manager = RoleClient::new(
        build_provider(&creds, &manager_ref)?,
        manager_ref.model.clone(),
        config.models.manager.temperature,
    );
    let developer = RoleClient::new(
        build_provider(&creds, &developer_ref)?,
        developer_ref.model.clone(),
        config.models.developer.temperature,
    );

    tracing::debug!(
        manager = %manager_ref,
        developer = %developer_ref,
        mode = %config.workflow.budget_mode,
        "starting {kind} workflow"
    );

    let mut workflow = Workflow::new(manager, developer, kind, engine_config);
    if !cli.quiet {
        workflow = workflow.with_progress(progress::terminal_progress());
    }
    if !cli.yes {
        workflow = workflow.with_confirm(|iteration| {
            inquire::Confirm::new(&format!(
                "Checkpoint at iteration {iteration}: continue iterating?"
            ))
            .with_default(true)
            .prompt()
            .unwrap_or(false)
        });
    }

    let result = workflow.run(&input).await?;

    // Final artifact on stdout, everything else on stderr
    println!("{}", result.output);

    let transcript = report::write_transcript(&config.output.dir(), kind, &input, &result)?;
    if !cli.quiet {
        eprintln!("transcript: {}", transcript.display());
        match result.stop_reason {
            StopReason::Approved => {
                eprintln!("APPROVED after {} iteration(s)", result.iterations)
            }
            reason => eprintln!(
                "stopped without approval after {} iteration(s): {}",
                result.iterations, reason
            ),
        }
    }

    Ok(())
}

fn parse_model(s: &str) -> anyhow::Result<ModelRef> {
    ModelRef::parse(s)
        .ok_or_else(|| anyhow::anyhow!("invalid model '{s}' (expected provider/model)"))
}
