//! formkit-check - load a menu configuration and report problems.
//!
//! Exits with status 1 when the validator reports errors.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use formkit_kernel::{ActionHandler, Collaborators, EngineConfig, MenuOrchestrator};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "formkit-check", version, about = "Validate a formkit menu configuration")]
struct Args {
    /// Configuration file (JSON)
    config: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// List the registered action types and exit
    #[arg(long)]
    list_actions: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = EngineConfig::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let engine = MenuOrchestrator::new(config, Collaborators::offline());

    if args.list_actions {
        let mut handlers = engine.registry().all();
        handlers.sort_by(|a, b| a.action_type().cmp(b.action_type()));
        for handler in handlers {
            println!("{:<12} {}", handler.action_type(), handler.describe());
            for example in handler.usage_examples() {
                println!("{:<12}   {}", "", example);
            }
        }
        engine.shutdown();
        return Ok(ExitCode::SUCCESS);
    }

    let report = engine.validate();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for error in &report.errors {
            println!("error: {error}");
        }
        for warning in &report.warnings {
            println!("warning: {warning}");
        }
        println!(
            "{} menus loaded, {} errors, {} warnings",
            engine.menu_names().len(),
            report.errors.len(),
            report.warnings.len()
        );
    }
    engine.shutdown();

    Ok(if report.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
