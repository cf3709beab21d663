mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use copydesk::errlog::ErrorLog;
use copydesk::ledger::BackupLedger;
use copydesk::plan::Plan;
use copydesk::planner::LlmPlanner;
use copydesk::prelude::*;
use copydesk::routing::EndpointRouter;

fn ledger_path() -> Result<PathBuf> {
    let proj = directories::ProjectDirs::from("dev", "copydesk", "copydesk")
        .context("unable to determine data directory")?;
    Ok(proj.data_dir().join("ledger.json"))
}

fn pick_site<'a>(store: &'a SiteStore, fragment: Option<&str>) -> Result<&'a Site> {
    match store.find(fragment) {
        Some(site) => Ok(site),
        None => {
            if store.sites.is_empty() {
                bail!(
                    "no sites saved; add one to {}",
                    SiteStore::default_path()?.display()
                );
            }
            bail!("no saved site matches {:?}", fragment.unwrap_or_default());
        }
    }
}

fn print_log(records: &[ExecutionRecord], errors: &ErrorLog) {
    for r in records {
        let mark = if r.success { "ok  " } else { "FAIL" };
        println!("{mark} {:7} {:>6}  {}", r.action, r.id, r.message);
        if !r.success {
            let _ = errors.log_error(&format!("{} {}: {}", r.action, r.id, r.message));
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let store = SiteStore::load(&SiteStore::default_path()?)?;
    let errors = ErrorLog::new(ErrorLog::default_path()?);

    match cli.command {
        Commands::Sites { probe } => {
            if store.sites.is_empty() {
                println!(
                    "No sites saved. Add one to {}",
                    SiteStore::default_path()?.display()
                );
                return Ok(());
            }
            for site in &store.sites {
                if probe {
                    let desk = Copydesk::new(site)?;
                    let status = if desk.probe().await { "ok" } else { "unreachable" };
                    println!("{}  ({}, {})", site.url, site.username, status);
                } else {
                    println!("{}  ({})", site.url, site.username);
                }
            }
        }
        Commands::Items { endpoint } => {
            let site = pick_site(&store, cli.site.as_deref())?;
            let desk = Copydesk::new(site)?;
            match desk.items(&endpoint).await {
                Ok(items) => {
                    for item in &items {
                        println!("{:>6}  {}", item.id, item.title_text());
                    }
                    println!("{} item(s) in {endpoint}", items.len());
                }
                Err(e) => {
                    // Failure to list is not "zero items"; say so.
                    let _ = errors.log_error(&format!("fetch {endpoint}: {e}"));
                    bail!("could not fetch items from {endpoint}: {e}");
                }
            }
        }
        Commands::Propose {
            command,
            endpoint,
            out,
        } => {
            let site = pick_site(&store, cli.site.as_deref())?;
            let router = EndpointRouter::default();
            let endpoint = endpoint.unwrap_or_else(|| router.classify(&command).to_string());

            let desk = Copydesk::new(site)?.with_planner(Box::new(LlmPlanner::from_env()?));
            let generated = desk.propose(&command, &endpoint, None).await?;

            if let Some(failure) = &generated.failure {
                let _ = errors.log_error(&format!("plan generation: {failure}"));
                eprintln!("plan generation degraded: {failure}");
            }
            if generated.plan.is_empty() {
                eprintln!("0 actions proposed for {endpoint}");
            }

            let json = serde_json::to_string_pretty(&generated.plan)?;
            println!("{json}");
            if let Some(path) = out {
                std::fs::write(&path, json)
                    .with_context(|| format!("writing plan to {}", path.display()))?;
                eprintln!("plan written to {} (endpoint: {endpoint})", path.display());
            }
        }
        Commands::Apply { plan, endpoint } => {
            let site = pick_site(&store, cli.site.as_deref())?;
            let text = std::fs::read_to_string(&plan)
                .with_context(|| format!("reading plan {}", plan.display()))?;
            let plan: Plan = serde_json::from_str(&text)
                .with_context(|| "plan file is not a valid action plan")?;

            let mut desk = Copydesk::new(site)?;
            let path = ledger_path()?;
            *desk.ledger_mut() = BackupLedger::load(&path);

            let records = desk.apply(&plan, &endpoint).await;
            desk.ledger().save(&path)?;

            print_log(&records, &errors);
            println!(
                "{} of {} action(s) succeeded",
                records.iter().filter(|r| r.success).count(),
                records.len()
            );
        }
        Commands::Rollback => {
            let site = pick_site(&store, cli.site.as_deref())?;
            let mut desk = Copydesk::new(site)?;
            let path = ledger_path()?;
            *desk.ledger_mut() = BackupLedger::load(&path);

            let (success, message) = desk.rollback_last().await;
            desk.ledger().save(&path)?;

            if success {
                println!("{message}");
            } else {
                let _ = errors.log_error(&format!("rollback: {message}"));
                bail!("{message}");
            }
        }
        Commands::Errors { limit } => {
            for entry in errors.recent(limit) {
                println!("{}  {}", entry.timestamp, entry.error);
            }
        }
    }

    Ok(())
}
