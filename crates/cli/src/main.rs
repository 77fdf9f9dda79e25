use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tgrelay")]
#[command(about = "Telegram to Grok webhook relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config.json.
    Init {
        /// Config file path (default: TGRELAY_CONFIG_PATH or ~/.tgrelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Run the gateway: health check on / and the webhook on /api/webhook and /telegram/webhook.
    Gateway {
        /// Config file path (default: TGRELAY_CONFIG_PATH or ~/.tgrelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// HTTP port (default from config or 3000)
        #[arg(long, short)]
        port: Option<u16>,

        /// Bind address (default from config or 127.0.0.1)
        #[arg(long, short)]
        bind: Option<String>,
    },

    /// Register a webhook URL with Telegram, passing the configured secret token.
    SetWebhook {
        /// Public URL Telegram should POST updates to.
        #[arg(long)]
        url: String,

        /// Config file path (default: TGRELAY_CONFIG_PATH or ~/.tgrelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Remove the webhook registration from Telegram.
    DeleteWebhook {
        /// Config file path (default: TGRELAY_CONFIG_PATH or ~/.tgrelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Version) => {
            println!("tgrelay {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Commands::Init { config }) => run_init(config),
        Some(Commands::Gateway { config, port, bind }) => run_gateway(config, port, bind).await,
        Some(Commands::SetWebhook { url, config }) => run_set_webhook(config, url).await,
        Some(Commands::DeleteWebhook { config }) => run_delete_webhook(config).await,
        None => {
            println!("Run with --help for usage");
            Ok(())
        }
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(relay::config::default_config_path);
    let dir = relay::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_gateway(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    bind: Option<String>,
) -> anyhow::Result<()> {
    let (mut config, path) = relay::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    if let Some(b) = bind {
        config.gateway.bind = b;
    }
    log::info!(
        "starting gateway on {}:{} (config {})",
        config.gateway.bind,
        config.gateway.port,
        path.display()
    );
    relay::gateway::run_gateway(config).await
}

/// Telegram client built from config; fails early when no bot token is available.
fn telegram_from_config(
    config_path: Option<PathBuf>,
) -> anyhow::Result<(relay::config::Config, relay::channels::TelegramChannel)> {
    let (config, _) = relay::config::load_config(config_path)?;
    let Some(token) = relay::config::resolve_telegram_token(&config) else {
        anyhow::bail!("no bot token: set TELEGRAM_BOT_TOKEN or channels.telegram.botToken");
    };
    let telegram = relay::channels::TelegramChannel::new(
        Some(token),
        Some(config.channels.telegram.api_base.clone()),
    );
    Ok((config, telegram))
}

async fn run_set_webhook(config_path: Option<PathBuf>, url: String) -> anyhow::Result<()> {
    let (config, telegram) = telegram_from_config(config_path)?;
    let secret = relay::config::resolve_webhook_secret(&config);
    if secret.is_none() {
        log::warn!("no webhook secret configured; the webhook will accept unsigned calls");
    }
    telegram.set_webhook(&url, secret.as_deref()).await?;
    println!("webhook set to {}", url);
    Ok(())
}

async fn run_delete_webhook(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let (_, telegram) = telegram_from_config(config_path)?;
    telegram.delete_webhook().await?;
    println!("webhook deleted");
    Ok(())
}
