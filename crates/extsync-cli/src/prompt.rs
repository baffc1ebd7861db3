//! Interactive terminal resolver.
//!
//! Prompts are drawn on stderr by `dialoguer`. Each prompt blocks, so it runs
//! on the blocking pool.

use std::io::IsTerminal;

use async_trait::async_trait;
use colored::Colorize;
use dialoguer::{Confirm, Select};
use extsync_core::{LocalSource, RemoteSource};
use extsync_reconcile::{DeploySummary, MigrationCandidate, Resolver, ResolverError};

use crate::output::print_summary;

const CREATE_NEW: &str = "Create a new registration";

/// Whether both stdin and stderr are attached to a terminal.
pub fn is_interactive_terminal() -> bool {
    std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
}

/// Answers resolver questions by prompting the user.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalResolver;

impl TerminalResolver {
    pub fn new() -> Self {
        Self
    }
}

async fn prompt_confirm(prompt: String) -> Result<bool, ResolverError> {
    tokio::task::spawn_blocking(move || {
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| ResolverError::prompt(e.to_string()))
    })
    .await
    .map_err(|e| ResolverError::prompt(e.to_string()))?
}

async fn prompt_select(prompt: String, items: Vec<String>) -> Result<usize, ResolverError> {
    tokio::task::spawn_blocking(move || {
        Select::new()
            .with_prompt(prompt)
            .items(&items)
            .default(0)
            .interact()
            .map_err(|e| ResolverError::prompt(e.to_string()))
    })
    .await
    .map_err(|e| ResolverError::prompt(e.to_string()))?
}

/// Candidate labels, with the create option last.
fn select_items(candidates: &[&RemoteSource]) -> Vec<String> {
    candidates
        .iter()
        .map(|remote| format!("{} ({})", remote.title, remote.uuid))
        .chain(std::iter::once(CREATE_NEW.to_string()))
        .collect()
}

#[async_trait]
impl Resolver for TerminalResolver {
    async fn confirm_match(
        &self,
        local: &LocalSource,
        remote: &RemoteSource,
    ) -> Result<bool, ResolverError> {
        prompt_confirm(format!(
            "Match {} ({}) to remote {} ({})?",
            local.title.bold(),
            local.handle,
            remote.title.bold(),
            remote.uuid
        ))
        .await
    }

    async fn confirm_migration(
        &self,
        candidates: &[MigrationCandidate],
    ) -> Result<bool, ResolverError> {
        eprintln!("{}", "These registrations will be migrated:".bold());
        for candidate in candidates {
            eprintln!(
                "  {} {}: {} -> {}",
                candidate.handle,
                candidate.registration.title.dimmed(),
                candidate.from_type(),
                candidate.to_type
            );
        }
        prompt_confirm("Migrate them?".to_string()).await
    }

    async fn confirm_deploy(&self, summary: &DeploySummary) -> Result<bool, ResolverError> {
        print_summary(summary);
        prompt_confirm("Deploy?".to_string()).await
    }

    async fn select_remote(
        &self,
        local: &LocalSource,
        candidates: &[&RemoteSource],
    ) -> Result<Option<usize>, ResolverError> {
        let prompt = format!("Which registration is {} ({})?", local.title.bold(), local.handle);
        let selected = prompt_select(prompt, select_items(candidates)).await?;
        Ok((selected < candidates.len()).then_some(selected))
    }
}
