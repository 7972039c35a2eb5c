use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{LevelFilter, info, warn};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;

use cli::Cli;
use cli::commands::Commands;
use toolchat::config::Config;
use toolchat::llm::{LlmClient, OllamaClient};
use toolchat::session::{ChatSession, Console, PageSession, SqlSession, StreamSession};
use toolchat::tools::{SqlCatalog, ToolRegistry};

type StdConsole = Console<tokio::io::BufReader<tokio::io::Stdin>, std::io::Stdout>;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("toolchat")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("toolchat.log");

    // Setup env_logger with file output so the terminal stays free for the REPL
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // Without RUST_LOG the filter is wide open and the configured level is applied later
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace"))
        .target(env_logger::Target::Pipe(target))
        .init();
    if std::env::var_os("RUST_LOG").is_none() {
        log::set_max_level(LevelFilter::Info);
    }

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let client: Arc<dyn LlmClient> = Arc::new(
        OllamaClient::new(config.llm.to_ollama_config()).context("Failed to create Ollama client")?,
    );
    let mut console: StdConsole = Console::new(tokio::io::BufReader::new(tokio::io::stdin()), std::io::stdout());

    match cli.command.clone().unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(cli, config, client, &mut console).await,
        Commands::Sql => {
            let model = cli.model.clone().unwrap_or_else(|| config.sql.model.clone());
            info!("Starting SQL session with {}", model);
            SqlSession::new(client, SqlCatalog::standard())
                .with_model(model)
                .with_temperature(config.sql.temperature)
                .run(&mut console)
                .await
        }
        Commands::Stream => {
            info!("Starting streaming session");
            StreamSession::new(client).run(&mut console).await
        }
        Commands::Ask => {
            info!("Starting page session");
            PageSession::new(client, config.rag.max_text_length)
                .run(&mut console)
                .await
        }
    }
}

async fn run_chat(cli: &Cli, config: &Config, client: Arc<dyn LlmClient>, console: &mut StdConsole) -> Result<()> {
    let mut session = ChatSession::new(client, ToolRegistry::standard())
        .with_json_mode(config.chat.json_mode)
        .with_raw_responses(cli.is_verbose() || config.chat.show_raw_responses);

    if !session.preflight(console).await? {
        // Pull hint already printed
        return Ok(());
    }

    info!("Starting chat session");
    session.run(console).await
}

/// Apply `log_level` from the config unless RUST_LOG already decided
fn apply_log_level(level: Option<&str>) {
    if std::env::var_os("RUST_LOG").is_some() {
        return;
    }
    match level.map(parse_level) {
        Some(Some(filter)) => log::set_max_level(filter),
        Some(None) => warn!("Ignoring unknown log_level {:?}", level),
        None => {}
    }
}

fn parse_level(level: &str) -> Option<LevelFilter> {
    level.trim().parse().ok()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first so config load problems are recorded
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration, then let the flags win
    let config = Config::load(cli.config.as_ref())
        .context("Failed to load configuration")?
        .with_overrides(cli.model.as_deref(), cli.base_url.as_deref());
    apply_log_level(config.log_level.as_deref());

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
