mod cli;
mod commands;
mod config;
mod observability;
mod output;
mod project;
mod prompt;
mod session;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use extsync_core::CoreError;
use extsync_reconcile::ReconcileError;
use extsync_registry_memory::RegistryError;

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let silent = e
            .downcast_ref::<ReconcileError>()
            .is_some_and(ReconcileError::is_silent);
        if !silent {
            let category = error_category(&e).unwrap_or_else(|| "cli".to_string());
            tracing::error!(%category, error = %format!("{e:#}"), "Command failed");
            print_error(&format!("{e:#}"));
        }
        std::process::exit(1);
    }
}

/// Category of the first known error in the chain.
fn error_category(e: &anyhow::Error) -> Option<String> {
    e.chain().find_map(|cause| {
        if let Some(err) = cause.downcast_ref::<ReconcileError>() {
            Some(err.category().to_string())
        } else if let Some(err) = cause.downcast_ref::<RegistryError>() {
            Some(err.category().to_string())
        } else {
            cause
                .downcast_ref::<CoreError>()
                .map(|err| err.category().to_string())
        }
    })
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let profile = &cli.profile;
    let cfg = config::load_profile(profile)?;
    observability::init_tracing_with_level(&observability::level_for(
        cli.verbose,
        cfg.log_level.as_deref(),
    ));
    let format = cli.format.or(cfg.output_format()).unwrap_or_default();
    let api_key = cli.api_key.as_deref();
    let state = cli.state.as_deref();

    match &cli.command {
        Commands::Plan(args) => {
            commands::plan::plan(args, api_key, state, &cfg, format).await?;
        }
        Commands::Deploy(args) => {
            commands::deploy::deploy(args, api_key, state, &cfg, format).await?;
        }
        Commands::Types => {
            commands::types::types(format)?;
        }
        Commands::Config(args) => match &args.command {
            cli::ConfigCommands::Show => {
                let unset = || "(not set)".to_string();
                println!("{}: {}", "Profile".cyan(), profile);
                println!(
                    "{}: {}",
                    "API key".cyan(),
                    cfg.api_key.clone().unwrap_or_else(unset)
                );
                println!(
                    "{}: {}",
                    "State".cyan(),
                    cfg.state
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(unset)
                );
                println!(
                    "{}: {}",
                    "Match key".cyan(),
                    cfg.match_key.unwrap_or_default()
                );
                println!(
                    "{}: {}",
                    "Include config".cyan(),
                    cfg.include_config_on_deploy.unwrap_or(false)
                );
                println!(
                    "{}: {}",
                    "Log level".cyan(),
                    cfg.log_level.as_deref().unwrap_or("warn")
                );
                println!(
                    "{}: {}",
                    "Format".cyan(),
                    cfg.format.as_deref().unwrap_or("table")
                );
            }
            cli::ConfigCommands::Set(set_args) => {
                let mut cfg = cfg.clone();
                cfg.set(&set_args.key, &set_args.value)?;
                config::save_profile(profile, &cfg)?;
                output::print_success(&format!("Set {} = {}", set_args.key, set_args.value));
            }
        },
    }

    Ok(())
}
