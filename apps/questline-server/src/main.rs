use anyhow::{anyhow, Context, Result};
use api_ingress::{ApiIngress, ApiIngressConfig};
use axum::Router;
use clap::{Parser, Subcommand};
use daily_quests::api::rest::dto::{DailyJobSummaryDto, EmailJobSummaryDto};
use daily_quests::domain::clock::ZonedClock;
use daily_quests::infra::seed::load_quest_seeds;
use daily_quests::{DailyQuests, DailyQuestsConfig};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

mod db;
mod shutdown;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const DAILY_QUESTS: &str = "daily_quests";
const API_INGRESS: &str = "api_ingress";

/// Questline Server - daily quests, reminder emails and one-click completion
#[derive(Parser)]
#[command(name = "questline-server")]
#[command(about = "Questline Server - daily quests, reminder emails and one-click completion")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
    /// Assign today's quest to every user and email it
    AssignDaily,
    /// Email today's assignments that have not been sent yet
    SendEmails,
    /// Load quests from a YAML file into the catalog
    SeedQuests {
        /// YAML file with a top-level `quests` list
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Questline server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(&config),
        Commands::AssignDaily => {
            let quests = bootstrap(&config, &args).await?;
            let summary = quests.client().run_daily_job().await?;
            print_json(&DailyJobSummaryDto::from(summary))
        }
        Commands::SendEmails => {
            let quests = bootstrap(&config, &args).await?;
            let summary = quests.client().run_email_job().await?;
            print_json(&EmailJobSummaryDto::from(summary))
        }
        Commands::SeedQuests { file } => {
            let seeds = load_quest_seeds(&file)?;
            let quests = bootstrap(&config, &args).await?;
            let written = quests.client().seed_quests(seeds).await?;
            println!("Seeded {written} quests from {}", file.display());
            Ok(())
        }
    }
}

/// Connect, migrate and wire the daily quests module.
async fn bootstrap(config: &AppConfig, args: &CliArgs) -> Result<DailyQuests> {
    let quests_cfg: DailyQuestsConfig = config.module_config(DAILY_QUESTS)?;
    let db = open_database(config, args).await?;
    DailyQuests::migrate(&db).await?;
    DailyQuests::init(&quests_cfg, db)
}

async fn open_database(config: &AppConfig, args: &CliArgs) -> Result<DatabaseConnection> {
    let db_config = config
        .database
        .as_ref()
        .ok_or_else(|| anyhow!("No database configuration found"))?;
    db::connect(db_config, Path::new(&config.server.home_dir), args.mock).await
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");

    let ingress_cfg: ApiIngressConfig = config.module_config(API_INGRESS)?;
    let ingress = ApiIngress::new(ingress_cfg);
    let addr = ingress.bind_addr(&config.server.host, config.server.port)?;

    let quests = bootstrap(&config, &args).await?;
    let router = ingress.build_router(quests.register_rest(Router::new()));

    let cancel = CancellationToken::new();
    shutdown::cancel_on_signal(cancel.clone());

    ingress.serve(router, addr, cancel).await?;
    tracing::info!("Questline server stopped");
    Ok(())
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    let quests_cfg: DailyQuestsConfig = config.module_config(DAILY_QUESTS)?;
    daily_quests::module::service_config(&quests_cfg)?;
    ZonedClock::from_name(&quests_cfg.timezone).map_err(|e| anyhow!(e))?;

    let ingress_cfg: ApiIngressConfig = config.module_config(API_INGRESS)?;
    ApiIngress::new(ingress_cfg).bind_addr(&config.server.host, config.server.port)?;

    if let Some(db_config) = &config.database {
        db::detect_backend(db_config.url.trim())?;
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Server config:");
    println!("{}", config.to_yaml()?);
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize job summary")?;
    println!("{out}");
    Ok(())
}
