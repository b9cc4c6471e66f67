use clap::{Parser, Subcommand};
use colored::*;
use std::net::IpAddr;
use std::process;

mod cli;

use cli::sessions::IssueSessionArgs;
use cli::timeline::TickArgs;
use rfpdesk_config::Config;

#[derive(Parser)]
#[command(name = "rfpdesk")]
#[command(about = "RFP Desk - RFP pipeline management server")]
#[command(version)]
struct Cli {
    /// Database URL (overrides RFPDESK_DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Address to bind (overrides RFPDESK_API_HOST)
        #[arg(long)]
        host: Option<IpAddr>,
        /// Port to listen on (overrides RFPDESK_API_PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Allowed CORS origin (overrides RFPDESK_CORS_ORIGIN)
        #[arg(long)]
        cors_origin: Option<String>,
    },
    /// Apply pending database migrations and exit
    Migrate,
    /// Run timeline ticks for one RFP or every active RFP with milestones
    Tick(TickArgs),
    /// Issue a bearer session for a user, creating the user if asked
    IssueSession(IssueSessionArgs),
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    rfpdesk_cli::init_tracing();

    let cli = Cli::parse();

    if let Err(e) = handle_command(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn handle_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(url) = cli.database_url {
        config.database_url = Some(url);
    }

    match cli.command {
        Commands::Serve {
            host,
            port,
            cors_origin,
        } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(origin) = cors_origin {
                config.cors_origin = origin;
            }
            rfpdesk_cli::run_server(config).await?;
        }
        Commands::Migrate => {
            let pool = rfpdesk_cli::open_database(&config).await?;
            pool.close().await;
            println!("{} Database is up to date", "✓".green());
        }
        Commands::Tick(args) => cli::timeline::run(&config, args).await?,
        Commands::IssueSession(args) => cli::sessions::run(&config, args).await?,
    }

    Ok(())
}
