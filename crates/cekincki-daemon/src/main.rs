//! Cekincki daemon
//!
//! Keeps a Discord guild's points roles in line with a Google Sheet:
//! - periodic reconciliation of members, sheet rows and roles
//! - change notifications by DM or channel message
//! - keepalive, status and slash command endpoints

use anyhow::Context;
use cekincki_daemon::cli::{Cli, Command};
use cekincki_daemon::{command_definitions, DaemonConfig, Server};
use cekincki_discord::DiscordClient;
use cekincki_sheets::{AccessTokenSource, CredentialSource, TokenProvider};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is read before clap so its values count as environment
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config =
        DaemonConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.overrides.apply(&mut config)?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    init_tracing(&config);

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::RegisterCommands => register_commands(config).await,
        Command::CheckGoogle => {
            if !check_google(&config).await {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn init_tracing(config: &DaemonConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn run(config: DaemonConfig) -> anyhow::Result<()> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        sheet = %config.sheets.sheet_name,
        interval_secs = config.sync.effective_interval_secs(),
        role_mode = %config.roles.mode,
        notify_mode = %config.notify.mode,
        "Starting cekincki daemon"
    );

    let server = Server::new(config)?;
    server.run().await?;
    Ok(())
}

async fn register_commands(config: DaemonConfig) -> anyhow::Result<()> {
    config.validate_for_registration()?;
    let (Some(token), Some(application_id), Some(guild_id)) = (
        config.token(),
        config.discord.application_id(),
        config.discord.guild_id(),
    ) else {
        anyhow::bail!("DISCORD_TOKEN, CLIENT_ID, and GUILD_ID must be set");
    };

    let client = DiscordClient::with_base_url(token, &config.discord.api_base)?;
    let commands = command_definitions();
    let count = client
        .register_guild_commands(&application_id, &guild_id, &commands)
        .await
        .context("Failed to register commands")?;

    tracing::info!("Registered {} command(s) for guild {}", count, guild_id);
    Ok(())
}

/// Print what the credentials look like, then try a token exchange
async fn check_google(config: &DaemonConfig) -> bool {
    let settings = &config.sheets.credentials;
    let report = settings.report();

    println!("[check-google] credentials source: {}", report.source);
    if let CredentialSource::File(path) = &report.source {
        println!("[check-google] path: {}", path.display());
    }
    println!("[check-google] has client_email: {}", report.has_client_email);
    println!("[check-google] has private_key: {}", report.has_private_key);

    let key = match settings.load() {
        Ok(key) => key,
        Err(e) => {
            eprintln!("[check-google] Auth failed: {}", e);
            return false;
        }
    };
    println!("[check-google] service account email: {}", key.client_email);

    let provider = TokenProvider::new(key, reqwest::Client::new());
    match provider.access_token().await {
        Ok(_) => {
            println!("[check-google] Auth success: received access token.");
            true
        }
        Err(e) => {
            eprintln!("[check-google] Auth failed: {}", e);
            false
        }
    }
}
