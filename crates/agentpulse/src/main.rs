mod output;
mod telemetry;

use std::path::PathBuf;

use anyhow::Context;
use agentpulse_core::config::Config;
use agentpulse_core::time::parse_duration_str;
use agentpulse_ingest::server::{ServerConfig, run_http_server};
use agentpulse_store::Store;
use clap::{Parser, Subcommand};

use crate::output::print_status_human;
use crate::telemetry::{init_cli_tracing, init_run_tracing};

#[derive(Parser, Debug)]
#[command(name = "agentpulse")]
#[command(about = "Local telemetry backend for AI coding assistants")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Run the ingestion API server")]
    Run {
        #[arg(long)]
        db_path: Option<PathBuf>,
        #[arg(long)]
        http_addr: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long, help = "Accept requests without an API key (local dev)")]
        allow_anonymous: bool,
        #[arg(long, help = "Commit correlation window, e.g. 5m or 90s")]
        correlation_window: Option<String>,
    },
    #[command(about = "Create the database and schema without serving")]
    Init {
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    #[command(about = "Show row counts and database size")]
    Status {
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            db_path,
            http_addr,
            api_key,
            allow_anonymous,
            correlation_window,
        } => {
            let mut cfg = Config::load().context("load config")?;
            if let Some(v) = db_path {
                cfg.db_path = v;
            }
            if let Some(v) = http_addr {
                cfg.http_addr = v;
            }
            if let Some(v) = api_key {
                cfg.api_key = v;
            }
            if allow_anonymous {
                cfg.allow_anonymous = true;
            }
            if let Some(v) = correlation_window {
                cfg.correlation_window =
                    parse_duration_str(&v).context("parse --correlation-window")?;
            }
            run_server(cfg).await
        }
        Commands::Init { db_path } => {
            init_cli_tracing();
            let mut cfg = Config::load().context("load config")?;
            if let Some(v) = db_path {
                cfg.db_path = v;
            }
            let store = Store::open(&cfg.db_path)?;
            let status = store.status()?;
            println!("initialized {}", status.db_path);
            Ok(())
        }
        Commands::Status { db_path } => {
            init_cli_tracing();
            let mut cfg = Config::load().context("load config")?;
            if let Some(v) = db_path {
                cfg.db_path = v;
            }
            let store = Store::open(&cfg.db_path)?;
            let status = store.status()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status_human(&status);
            }
            Ok(())
        }
    }
}

async fn run_server(cfg: Config) -> anyhow::Result<()> {
    init_run_tracing();

    let store = Store::open(&cfg.db_path)?;

    eprintln!("agentpulse run");
    eprintln!("  db: {}", cfg.db_path.display());
    eprintln!("  http: {}", cfg.http_addr);
    if cfg.allow_anonymous {
        eprintln!("  auth: anonymous requests allowed");
    }
    eprintln!(
        "  correlation window: {}",
        humantime::format_duration(cfg.correlation_window)
    );

    let server_task = tokio::spawn(run_http_server(
        store,
        ServerConfig {
            http_addr: cfg.http_addr.clone(),
            api_key: cfg.api_key.clone(),
            allow_anonymous: cfg.allow_anonymous,
            correlation_window: cfg.correlation_window,
        },
    ));

    tokio::select! {
        res = server_task => {
            res??;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl-c, shutting down");
        }
    }

    Ok(())
}
