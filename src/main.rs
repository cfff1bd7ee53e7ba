use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use order_bot::application::errors::{ConfigError, EmailError, MessagingError, StorageError};
use order_bot::application::services::{ProcessMessageRequest, ProcessMessageUseCase, SessionCleanupService};
use order_bot::domain::entities::MenuItem;
use order_bot::domain::traits::{ChatMessenger, ChatSessionRepository, EmailService, MenuRepository};
use order_bot::infrastructure::adapters::{ChatGuruMessenger, ConsoleMessenger, TwilioMessenger};
use order_bot::infrastructure::config::{Config, MessagingProvider, StorageBackend};
use order_bot::infrastructure::database::SqliteStore;
use order_bot::infrastructure::email::{LogEmailService, ResendEmailService};
use order_bot::infrastructure::storage::{
    default_catalog, load_catalog, InMemoryChatSessionRepository, InMemoryMenuRepository,
};
use order_bot::infrastructure::web::{self, AppState, RateLimiter};

type BoxError = Box<dyn Error>;

#[derive(Parser)]
#[command(name = "order-bot")]
#[command(about = "WhatsApp ordering bot for delivery restaurants", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server
    Run,
    /// Chat with the bot from the terminal
    Console {
        /// Phone number the conversation is held for
        #[arg(long, default_value = "5511999999999")]
        phone: String,
    },
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => block_on(run_server(&cli.config)),
        Commands::Console { phone } => block_on(run_console(&cli.config, phone)),
        Commands::Version => {
            println!("order-bot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn block_on<F>(future: F) -> Result<(), BoxError>
where
    F: std::future::Future<Output = Result<(), BoxError>>,
{
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(future)
}

fn load_config(path: &str) -> Result<Config, ConfigError> {
    let mut config = if Path::new(path).exists() {
        Config::load(path)?
    } else {
        tracing::info!("Config file {} not found, using defaults", path);
        Config::default()
    };

    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

fn catalog(config: &Config) -> Result<Vec<MenuItem>, StorageError> {
    match &config.menu.catalog_path {
        Some(path) => {
            let items = load_catalog(path)?;
            tracing::info!("Loaded {} menu items from {}", items.len(), path.display());
            Ok(items)
        }
        None => Ok(default_catalog()),
    }
}

type Repositories = (Arc<dyn ChatSessionRepository>, Arc<dyn MenuRepository>);

fn repositories(config: &Config) -> Result<Repositories, StorageError> {
    let catalog = catalog(config)?;

    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory storage");
            Ok((
                Arc::new(InMemoryChatSessionRepository::new()),
                Arc::new(InMemoryMenuRepository::new(catalog)),
            ))
        }
        StorageBackend::Sqlite => {
            tracing::info!("Using SQLite storage at {}", config.storage.sqlite_path.display());
            let store = Arc::new(SqliteStore::open(&config.storage.sqlite_path, &catalog)?);
            Ok((store.clone(), store))
        }
    }
}

fn messenger(config: &Config) -> Result<Arc<dyn ChatMessenger>, MessagingError> {
    let messenger: Arc<dyn ChatMessenger> = match config.messaging.provider {
        MessagingProvider::Console => Arc::new(ConsoleMessenger::new()),
        MessagingProvider::Chatguru => Arc::new(ChatGuruMessenger::new(config.messaging.chatguru.clone())?),
        MessagingProvider::Twilio => Arc::new(TwilioMessenger::new(config.messaging.twilio.clone())?),
    };
    tracing::info!("Messaging provider: {}", messenger.provider());
    Ok(messenger)
}

fn mailer(config: &Config) -> Result<Arc<dyn EmailService>, EmailError> {
    if config.email.is_enabled() {
        Ok(Arc::new(ResendEmailService::new(config.email.clone())?))
    } else {
        tracing::info!("No email provider configured, confirmation emails are only logged");
        Ok(Arc::new(LogEmailService))
    }
}

fn use_case(
    config: &Config,
    sessions: Arc<dyn ChatSessionRepository>,
    menu: Arc<dyn MenuRepository>,
    messenger: Arc<dyn ChatMessenger>,
) -> Result<ProcessMessageUseCase, EmailError> {
    Ok(ProcessMessageUseCase::new(sessions, menu, messenger, mailer(config)?)
        .with_session_timeout(config.session.timeout_ms)
        .with_delivery_fee(config.order.delivery_fee_cents))
}

async fn run_server(config_path: &str) -> Result<(), BoxError> {
    let config = load_config(config_path)?;
    tracing::info!("Starting {}", config.bot.name);

    let (sessions, menu) = repositories(&config)?;
    let use_case = use_case(&config, sessions.clone(), menu, messenger(&config)?)?;

    let cleanup = SessionCleanupService::new(sessions, config.session.timeout_ms)
        .with_interval(Duration::from_millis(config.session.cleanup_interval_ms))
        .spawn();

    let state = AppState::new(
        Arc::new(use_case),
        Arc::new(RateLimiter::from_config(&config.security.rate_limit)),
    );
    web::serve(&config.server.bind_address(), state, shutdown_signal()).await?;

    cleanup.abort();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

async fn run_console(config_path: &str, phone: String) -> Result<(), BoxError> {
    let config = load_config(config_path)?;
    let (sessions, menu) = repositories(&config)?;
    let use_case = use_case(&config, sessions, menu, Arc::new(ConsoleMessenger::new()))?;

    println!("order-bot console - chatting as {} (type 'sair' to quit)\n", phone);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if matches!(text, "sair" | "exit" | "quit") {
            break;
        }

        let response = use_case.execute(ProcessMessageRequest::new(phone.as_str(), text)).await;
        if !response.success {
            println!("[ERRO] {}", response.error.unwrap_or_default());
        }
    }

    Ok(())
}

fn init_config() -> Result<(), BoxError> {
    let yaml = Config::default().to_yaml()?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}
