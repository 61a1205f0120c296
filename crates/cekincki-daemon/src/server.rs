//! Server setup and lifecycle management

use crate::api::{create_router, AppState};
use crate::commands::CommandHandler;
use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use crate::notify::Notifier;
use crate::roles::RoleApplier;
use crate::scheduler::{Reconciler, Scheduler};
use cekincki_discord::{DiscordClient, DiscordGateway, GuildGateway};
use cekincki_sheets::{RosterSheet, SheetsClient, TokenProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Cekincki daemon
pub struct Server {
    config: DaemonConfig,
    gateway: Arc<dyn GuildGateway>,
    reconciler: Arc<Reconciler>,
    commands: Arc<CommandHandler>,
}

impl Server {
    /// Wire Discord, Sheets and the reconciler from `config`
    pub fn new(config: DaemonConfig) -> DaemonResult<Self> {
        config.validate_for_run()?;
        let token = config.token().unwrap_or_default();
        let spreadsheet_id = config.spreadsheet_id().unwrap_or_default();
        let guild_id = config
            .discord
            .guild_id()
            .ok_or_else(|| DaemonError::Config("Missing GUILD_ID in env".to_string()))?;

        let discord = DiscordClient::with_base_url(token, &config.discord.api_base)?;
        let gateway: Arc<dyn GuildGateway> =
            Arc::new(DiscordGateway::new(discord.clone(), guild_id));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DaemonError::Server(e.to_string()))?;
        let key = config.sheets.credentials.load()?;
        tracing::info!(client_email = %key.client_email, "Loaded service account");
        let tokens = Arc::new(TokenProvider::new(key, http.clone()));
        let sheets =
            SheetsClient::with_client(http, &config.sheets.api_base, spreadsheet_id, tokens)?;
        let roster = RosterSheet::new(Arc::new(sheets), config.sheets.sheet_name.clone());

        Ok(Self::with_components(config, gateway, roster, Arc::new(discord)))
    }

    /// Assemble a server from already-built adapters
    pub fn with_components(
        config: DaemonConfig,
        gateway: Arc<dyn GuildGateway>,
        roster: RosterSheet,
        followup: Arc<dyn crate::commands::Followup>,
    ) -> Self {
        let roles = RoleApplier::new(
            gateway.clone(),
            config.roles.prefix.clone(),
            config.roles.mode,
            config.roles.tiers.clone(),
        );
        let notifier = Notifier::new(
            gateway.clone(),
            config.notify.mode,
            config.notify.channel_id(),
            config.notify.template.clone(),
        );
        let reconciler = Arc::new(Reconciler::new(
            gateway.clone(),
            roster,
            roles,
            notifier,
            config.notify.enabled,
        ));
        let commands = Arc::new(CommandHandler::new(reconciler.clone(), followup));

        Self {
            config,
            gateway,
            reconciler,
            commands,
        }
    }

    pub fn state(&self) -> AppState {
        AppState::new(
            self.reconciler.clone(),
            self.commands.clone(),
            self.config.discord.public_key().map(str::to_string),
            self.config.discord.guild_id.clone().unwrap_or_default(),
            self.config.spreadsheet_id().unwrap_or_default(),
        )
    }

    /// Run until Ctrl+C or SIGTERM
    pub async fn run(self) -> DaemonResult<()> {
        let guild_name = self.gateway.guild_name().await?;
        tracing::info!(guild = %guild_name, "Connected to guild: {}", guild_name);
        tracing::info!(
            spreadsheet_id = %self.config.spreadsheet_id().unwrap_or_default(),
            sheet = %self.reconciler.roster().tab(),
            "Target spreadsheet"
        );

        let scheduler = Scheduler::new(
            self.config.sync.effective_interval_secs(),
            self.reconciler.clone(),
        );
        let scheduler_handle = tokio::spawn(scheduler.clone().start());

        match self.config.server.listen_addr() {
            Some(addr) => {
                let app = create_router(self.state(), self.config.server.enable_cors);
                let listener = TcpListener::bind(addr).await?;
                tracing::info!("HTTP server listening on {}", addr);

                axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown_signal())
                    .await
                    .map_err(|e| DaemonError::Server(e.to_string()))?;
            }
            None => {
                tracing::info!("PORT not set; skipping HTTP server");
                shutdown_signal().await;
            }
        }

        tracing::info!("Cekincki daemon shutting down");

        scheduler.stop().await;
        scheduler_handle.abort();

        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
