use anyhow::Result;
use colored::Colorize;
use extsync_core::{RemoteSource, SpecificationRegistry};
use extsync_reconcile::{DeploySummary, DeploymentIds, Plan};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

fn remote_label(registration: &RemoteSource) -> String {
    format!("{} ({})", registration.title, registration.uuid)
}

pub fn plan_rows(plan: &Plan) -> Vec<[String; 3]> {
    let mut rows = Vec::new();
    for candidate in &plan.migrations {
        rows.push([
            candidate.handle.clone(),
            format!("migrate {} -> {}", candidate.from_type(), candidate.to_type),
            remote_label(&candidate.registration),
        ]);
    }
    for (handle, uuid) in &plan.extensions.valid_matches {
        rows.push([handle.clone(), "match".to_string(), uuid.clone()]);
    }
    for source in &plan.extensions.extensions_to_create {
        rows.push([source.handle.clone(), "create".to_string(), "-".to_string()]);
    }
    for registration in &plan.extensions.unmatched_remote {
        rows.push(["-".to_string(), "unmatched".to_string(), remote_label(registration)]);
    }
    for registration in &plan.extensions.dashboard_only_extensions {
        rows.push(["-".to_string(), "dashboard only".to_string(), remote_label(registration)]);
    }
    rows
}

pub fn print_plan(plan: &Plan, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(plan);
    }
    let rows = plan_rows(plan);
    if rows.is_empty() {
        println!("Nothing to deploy.");
        return Ok(());
    }
    let mut builder = Builder::default();
    builder.push_record(["Handle", "Action", "Remote"]);
    for row in rows {
        builder.push_record(row);
    }
    println!("{}", builder.build().with(Style::rounded()));
    if !plan.configuration_managed.is_empty() {
        println!(
            "{}: {} registrations managed by configuration",
            "Config".cyan(),
            plan.configuration_managed.len()
        );
    }
    Ok(())
}

pub fn print_summary(summary: &DeploySummary) {
    eprintln!("{}", "Deploy summary".bold());
    for handle in &summary.to_create {
        eprintln!("  {} {}", "+".green(), handle);
    }
    for (handle, uuid) in &summary.matched {
        eprintln!("  {} {} -> {}", "=".cyan(), handle, uuid.dimmed());
    }
    for title in summary.unmatched_remote.iter().chain(&summary.dashboard_only) {
        eprintln!("  {} {} (remote only)", "-".yellow(), title);
    }
    if summary.release {
        eprintln!("  {}", "This deploy will be released".yellow());
    }
}

pub fn print_deployment_ids(ids: &DeploymentIds, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(ids);
    }
    let mut builder = Builder::default();
    builder.push_record(["Handle", "UUID", "ID"]);
    for (handle, uuid) in &ids.extensions {
        let id = ids.extension_ids.get(handle).map(String::as_str).unwrap_or("-");
        builder.push_record([handle.as_str(), uuid.as_str(), id]);
    }
    for (handle, uuids) in &ids.extensions_non_uuid_managed {
        let id_list = ids
            .extension_ids_non_uuid_managed
            .get(handle)
            .map(|list| list.join(", "))
            .unwrap_or_default();
        builder.push_record([handle.clone(), uuids.join(", "), id_list]);
    }
    println!("{}", builder.build().with(Style::rounded()));
    Ok(())
}

pub fn print_types(specs: &SpecificationRegistry, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        let all: Vec<_> = specs.iter().collect();
        return print_json(&all);
    }
    let mut builder = Builder::default();
    builder.push_record(["Identifier", "Remote type", "Policy", "Migrates from"]);
    for spec in specs.iter() {
        let legacy: Vec<&str> = spec.legacy_types.iter().map(|t| t.as_str()).collect();
        builder.push_record([
            spec.identifier.clone(),
            spec.graphql_type.to_string(),
            spec.policy.to_string(),
            legacy.join(", "),
        ]);
    }
    println!("{}", builder.build().with(Style::rounded()));
    Ok(())
}
