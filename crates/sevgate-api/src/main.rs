//! Binary entrypoint: `sevgate serve | check | trend`
use anyhow::Context;
use clap::{Parser, Subcommand};
use sevgate_api::{run, GateService};
use sevgate_core::{BlockingMode, GateConfig, GateScope};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sevgate", version, about = "Severity intelligence and commit gate")]
struct Cli {
    /// YAML configuration file
    #[arg(long, env = "SEVGATE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the blocking mode (normal, strict, criticalHighOnly)
    #[arg(long, global = true)]
    mode: Option<BlockingMode>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve {
        #[arg(long, env = "SEVGATE_ADDR", default_value = "127.0.0.1:8787")]
        addr: String,
    },
    /// Run a gate check; exits 1 when the commit is blocked
    Check {
        /// Scanner output to read instead of the configured path
        #[arg(long)]
        violations: Option<PathBuf>,
        /// Consider every violation, not only staged files
        #[arg(long)]
        repo: bool,
        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the severity trend
    Trend {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<GateConfig> {
    let mut config = match &cli.config {
        Some(path) => GateConfig::from_yaml_file(path)?.apply_env(|key| std::env::var(key).ok())?,
        None => GateConfig::default().apply_env(|key| std::env::var(key).ok())?,
    };
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if let Command::Check {
        violations, repo, ..
    } = &cli.command
    {
        if let Some(path) = violations {
            config.violations_path = path.clone();
        }
        if *repo {
            config.scope = GateScope::Repo;
        }
    }
    config.validate()?;
    Ok(config)
}

async fn execute(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = load_config(&cli).context("invalid configuration")?;
    let service = GateService::from_config(config)?;

    match cli.command {
        Command::Serve { addr } => {
            run(&addr, Arc::new(service))
                .await
                .with_context(|| format!("server on {} failed", addr))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { json, .. } => {
            let response = tokio::task::spawn_blocking(move || service.gate_check()).await??;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{}", response.message);
                for warning in &response.warnings {
                    eprintln!("warning: {}", warning);
                }
            }
            Ok(if response.decision.should_block {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            })
        }
        Command::Trend { limit, json } => {
            let report = service.trend(limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Trend: {} over {} entries (score {:+.1}, count {:+})",
                    report.trend, report.window, report.score_delta, report.count_delta
                );
                if let Some(latest) = &report.latest {
                    println!(
                        "Latest: {} violations, average score {:.1}/100, gate {}",
                        latest.total,
                        latest.average_score,
                        if latest.gate_passed { "passed" } else { "blocked" }
                    );
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match execute(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("sevgate: {:#}", e);
            ExitCode::from(2)
        }
    }
}
