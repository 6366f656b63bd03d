//! kportal-api - CLI tool for the KPortal environment backend
//!
//! Lists, creates and operates environments, watches their container
//! statuses and prints cost data from the command line.

mod client;
mod output;

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use futures_util::future::join_all;
use shared::api::{EnvironmentApi, DEFAULT_API_URL};
use shared::cost::DEFAULT_COST_DAYS;
use shared::poller::DEFAULT_POLL_INTERVAL;
use shared::{
    CostSummary, EnvAction, EnvironmentId, EnvironmentType, NewEnvironment, PollOutcome,
    StatusPair, StatusPoller,
};
use tabled::Table;
use tracing_subscriber::EnvFilter;

use client::NativeApiClient;
use output::{print_cost_summary, status_colored, status_line, CostRow, EnvironmentRow};

#[derive(Parser)]
#[command(name = "kportal-api")]
#[command(about = "CLI tool for the KPortal environment backend", long_about = None)]
struct Cli {
    /// Backend API base URL
    #[arg(short, long, env = "KPORTAL_API_URL", default_value = DEFAULT_API_URL)]
    server: String,

    /// Bearer token for authenticated endpoints
    #[arg(short, long, env = "KPORTAL_TOKEN")]
    token: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
    Table,
}

#[derive(Subcommand)]
enum Commands {
    /// Environment management
    Envs {
        #[command(subcommand)]
        action: EnvCommand,
    },

    /// Poll environment statuses until interrupted
    Watch {
        /// Seconds between polls
        #[arg(short, long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
        interval: u64,
        /// Environments to watch (all when omitted)
        ids: Vec<EnvironmentId>,
    },

    /// Cost data for an environment
    Cost {
        id: EnvironmentId,
        /// Look-back window in days
        #[arg(short, long, default_value_t = DEFAULT_COST_DAYS)]
        days: u32,
    },

    /// Azure resource discovery
    Azure {
        #[command(subcommand)]
        action: AzureCommand,
    },
}

#[derive(Subcommand)]
enum EnvCommand {
    /// List all environments
    List,
    /// Register a new environment
    Create {
        #[arg(short, long)]
        name: String,
        /// PROD, QA, DEV or INTEGRATION
        #[arg(long = "type", default_value = "DEV", value_parser = parse_env_type)]
        env_type: EnvironmentType,
        #[arg(short, long)]
        resource_group: String,
        /// Frontend container app name
        #[arg(long)]
        frontend: String,
        /// Backend container app name
        #[arg(long)]
        backend: String,
    },
    /// Delete an environment
    Delete { id: EnvironmentId },
    /// Show the classified container statuses
    Status { id: EnvironmentId },
    /// Start both containers
    Start { id: EnvironmentId },
    /// Stop both containers
    Stop { id: EnvironmentId },
    /// Restart both containers
    Restart { id: EnvironmentId },
}

#[derive(Subcommand)]
enum AzureCommand {
    /// List resource groups
    Groups,
    /// List container apps in a resource group
    Apps { resource_group: String },
}

fn parse_env_type(s: &str) -> Result<EnvironmentType, String> {
    let upper = s.trim().to_uppercase();
    EnvironmentType::ALL
        .into_iter()
        .find(|t| t.as_str() == upper || t.short_label() == upper)
        .ok_or_else(|| format!("unknown environment type '{}'", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = NativeApiClient::new(&cli.server, cli.token.as_deref())?;
    tracing::debug!("Using backend at {}", client.base_url());

    match cli.command {
        Commands::Envs { action } => run_env_command(&client, cli.format, action).await?,
        Commands::Watch { interval, ids } => {
            watch(&client, Duration::from_secs(interval.max(1)), ids).await?
        }
        Commands::Cost { id, days } => {
            let response = client
                .environment_cost(id, days)
                .await
                .with_context(|| format!("Failed to load cost data for environment {}", id))?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
                OutputFormat::Table => {
                    let rows: Vec<CostRow> = response
                        .daily_costs
                        .iter()
                        .map(|d| CostRow::new(d, &response.currency))
                        .collect();
                    println!("{}", Table::new(rows));
                }
                OutputFormat::Pretty => {
                    println!(
                        "{} environment {} (last {} days)",
                        "Cost for".bold(),
                        id,
                        days
                    );
                    print_cost_summary(&CostSummary::from_response(&response));
                }
            }
        }
        Commands::Azure { action } => {
            let names = match &action {
                AzureCommand::Groups => client
                    .resource_groups()
                    .await
                    .context("Failed to list resource groups")?,
                AzureCommand::Apps { resource_group } => client
                    .container_apps(resource_group)
                    .await
                    .with_context(|| format!("Failed to list container apps in {}", resource_group))?,
            };
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&names)?),
                OutputFormat::Pretty | OutputFormat::Table => {
                    if names.is_empty() {
                        println!("Nothing found");
                    }
                    for name in names {
                        println!("  {}", name);
                    }
                }
            }
        }
    }

    Ok(())
}

async fn run_env_command(
    client: &NativeApiClient,
    format: OutputFormat,
    action: EnvCommand,
) -> Result<()> {
    match action {
        EnvCommand::List => {
            let envs = client
                .list_environments()
                .await
                .context("Failed to load environments")?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&envs)?),
                OutputFormat::Table => {
                    if envs.is_empty() {
                        println!("No environments found");
                    } else {
                        let rows: Vec<EnvironmentRow> =
                            envs.iter().map(EnvironmentRow::from).collect();
                        println!("{}", Table::new(rows));
                    }
                }
                OutputFormat::Pretty => {
                    if envs.is_empty() {
                        println!("No environments found");
                    } else {
                        println!("{} {} environment(s):", "Found".bold(), envs.len());
                        for env in &envs {
                            println!(
                                "\n  {} {} [{}]",
                                "●".blue(),
                                env.name.bold(),
                                env.env_type.short_label()
                            );
                            println!("    ID: {}", env.id);
                            println!("    Resource group: {}", env.resource_group.cyan());
                            println!("    Frontend: {}", env.frontend_app_name);
                            println!("    Backend: {}", env.backend_app_name);
                        }
                    }
                }
            }
        }
        EnvCommand::Create {
            name,
            env_type,
            resource_group,
            frontend,
            backend,
        } => {
            let form = NewEnvironment {
                name,
                env_type,
                resource_group,
                frontend_name: frontend,
                backend_name: backend,
            };
            let req = form.validate()?;
            let created = client
                .create_environment(&req)
                .await
                .context("Failed to create environment")?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&created)?),
                OutputFormat::Pretty | OutputFormat::Table => {
                    println!(
                        "{} Environment {} created with ID {}",
                        "✓".green(),
                        created.name.bold(),
                        created.id
                    );
                }
            }
        }
        EnvCommand::Delete { id } => {
            client
                .delete_environment(id)
                .await
                .with_context(|| format!("Failed to delete environment {}", id))?;
            println!("{} Environment {} deleted", "✓".green(), id);
        }
        EnvCommand::Status { id } => {
            let raw = client
                .environment_status(id)
                .await
                .with_context(|| format!("Failed to fetch status of environment {}", id))?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&raw)?),
                OutputFormat::Pretty | OutputFormat::Table => {
                    let statuses = StatusPair::from(&raw);
                    println!("{} environment {}", "Status of".bold(), id);
                    println!(
                        "  Frontend: {} ({})",
                        status_colored(statuses.frontend),
                        raw.frontend_status.dimmed()
                    );
                    println!(
                        "  Backend:  {} ({})",
                        status_colored(statuses.backend),
                        raw.backend_status.dimmed()
                    );
                }
            }
        }
        EnvCommand::Start { id } => run_action(client, format, id, EnvAction::Start).await?,
        EnvCommand::Stop { id } => run_action(client, format, id, EnvAction::Stop).await?,
        EnvCommand::Restart { id } => run_action(client, format, id, EnvAction::Restart).await?,
    }
    Ok(())
}

async fn run_action(
    client: &NativeApiClient,
    format: OutputFormat,
    id: EnvironmentId,
    action: EnvAction,
) -> Result<()> {
    println!("{} {}", "→".blue(), action.progress_label());
    let response = client
        .run_action(id, action)
        .await
        .with_context(|| format!("Failed to {} environment {}", action, id))?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Pretty | OutputFormat::Table => {
            println!("{} {} requested for environment {}", "✓".green(), action.label(), id);
            if !response.status.is_empty() {
                println!("  {}", response.status.dimmed());
            }
        }
    }
    Ok(())
}

/// One independent poller per environment, all driven from this task until
/// Ctrl-C.
async fn watch(client: &NativeApiClient, interval: Duration, ids: Vec<EnvironmentId>) -> Result<()> {
    let envs = client
        .list_environments()
        .await
        .context("Failed to load environments")?;
    let names: HashMap<EnvironmentId, String> =
        envs.iter().map(|e| (e.id, e.name.clone())).collect();

    let ids = if ids.is_empty() {
        envs.iter().map(|e| e.id).collect()
    } else {
        ids
    };
    if ids.is_empty() {
        bail!("No environments to watch");
    }

    let pollers: Vec<_> = ids
        .iter()
        .map(|id| StatusPoller::new(*id, client).with_interval(interval))
        .collect();
    let handles: Vec<_> = pollers.iter().map(|p| p.handle()).collect();

    println!(
        "{} {} environment(s) every {}s, Ctrl-C to stop",
        "Watching".bold(),
        pollers.len(),
        interval.as_secs()
    );

    let runs = pollers.iter().map(|poller| {
        let id = poller.environment_id();
        let name = names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("#{}", id));
        poller.run(tokio::time::sleep, move |outcome| {
            if let PollOutcome::Failed(e) = &outcome {
                tracing::warn!("Status fetch for {} failed: {}", name, e);
            }
            if let Some(statuses) = outcome.statuses() {
                println!("{}", status_line(&name, &statuses));
            }
        })
    });

    tokio::select! {
        _ = join_all(runs) => {}
        _ = tokio::signal::ctrl_c() => {
            for handle in &handles {
                handle.cancel();
            }
            tracing::info!("Stopped watching");
        }
    }
    Ok(())
}
