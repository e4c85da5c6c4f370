use std::{collections::HashMap, future::Future, sync::Arc};

use anyhow::Context as AnyhowContext;
use serenity::{
    Client,
    all::{
        Command, CommandInteraction, ComponentInteraction, Context, CreateCommand, EventHandler,
        GuildId, Http, Interaction, Ready,
    },
    async_trait,
    model::prelude::GatewayIntents,
};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod constant;
mod controls;
mod moderation;
mod panels;
mod platform;
mod reply;
mod store;
#[cfg(test)]
mod test_util;
mod tickets;
mod util;
mod verify;

use config::Configuration;

use crate::{
    commands::{CommandHandler, SharedState, panel::PanelKind},
    controls::Control,
    moderation::Sanction,
    platform::DiscordPlatform,
    reply::Reply,
    store::TicketStore,
    tickets::CloseOrigin,
    util::RespondableInteraction,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Configuration::load()?;
    let discord_token = config
        .authentication
        .discord_token
        .clone()
        .context("Expected authentication.discord_token to be filled in config")?;
    let command_guild = match config.discord.guild_id {
        Some(0) => anyhow::bail!("discord.guild_id must be a valid guild id"),
        Some(id) => Some(GuildId::new(id)),
        None => None,
    };

    let store = Arc::new(TicketStore::load(config.tickets.store_path()).await?);
    let state = Arc::new(SharedState {
        config: Arc::new(config),
        store,
    });

    let mut client = Client::builder(
        discord_token,
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MEMBERS,
    )
    .event_handler(Handler {
        handlers: build_handlers(state.clone()),
        command_guild,
        state,
    })
    .await
    .context("Error creating client")?;

    let shard_manager = client.shard_manager.clone();
    if run_until_shutdown(client.start(), shutdown_signal()).await? == Exit::Requested {
        info!("Shutdown requested; disconnecting");
        shard_manager.shutdown_all().await;
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Exit {
    /// The gateway connection ended by itself.
    Stopped,
    Requested,
}

/// Drives the gateway until it ends or `shutdown` resolves, whichever comes first.
async fn run_until_shutdown<E>(
    gateway: impl Future<Output = Result<(), E>>,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<Exit>
where
    E: std::error::Error + Send + Sync + 'static,
{
    tokio::select! {
        result = gateway => {
            result.context("Client error")?;
            Ok(Exit::Stopped)
        }
        () = shutdown => Ok(Exit::Requested),
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

fn build_handlers(state: Arc<SharedState>) -> HashMap<String, Arc<dyn CommandHandler>> {
    let handlers: Vec<Arc<dyn CommandHandler>> = vec![
        Arc::new(commands::sanction::Handler::new(Sanction::Ban)),
        Arc::new(commands::sanction::Handler::new(Sanction::Kick)),
        Arc::new(commands::say::Handler),
        Arc::new(commands::lock::Handler),
        Arc::new(commands::panel::Handler::new(
            PanelKind::Verify,
            state.clone(),
        )),
        Arc::new(commands::panel::Handler::new(
            PanelKind::Ticket,
            state.clone(),
        )),
        Arc::new(commands::close_ticket::Handler::new(state)),
    ];

    handlers
        .into_iter()
        .map(|handler| (handler.name().to_string(), handler))
        .collect()
}

pub struct Handler {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
    /// Register commands on this guild instead of globally
    command_guild: Option<GuildId>,
    state: Arc<SharedState>,
}
#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        if let Err(err) = self.ready_impl(&ctx.http, ready).await {
            error!("Error while registering commands: {err:?}");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Some(respondable) = util::interaction_to_respondable_interaction(&interaction) else {
            debug!(kind = ?interaction.kind(), "ignoring interaction");
            return;
        };

        let platform = DiscordPlatform::new(ctx.http.clone(), ctx.cache.clone());
        let result = match &interaction {
            Interaction::Command(cmd) => self.command(&platform, cmd).await,
            Interaction::Component(cmp) => self.component(&platform, cmp).await,
            _ => Ok(None),
        };

        let reply = match result {
            Ok(Some(reply)) => reply,
            Ok(None) => return,
            Err(err) => {
                error!(
                    id = %interaction.id(),
                    kind = ?interaction.kind(),
                    "interaction failed: {err:?}"
                );
                Reply::private(format!("An error occurred: {err}"))
            }
        };

        if let Err(err) = respondable.create(&ctx.http, &reply).await {
            error!("failed to respond to interaction: {err:?}");
        }
    }
}
impl Handler {
    async fn ready_impl(&self, http: &Http, ready: Ready) -> anyhow::Result<()> {
        info!("{} is connected; registering commands...", ready.user.name);

        let commands: Vec<CreateCommand> = self
            .handlers
            .values()
            .map(|handler| handler.command())
            .collect();
        match self.command_guild {
            Some(guild_id) => {
                guild_id.set_commands(http, commands).await?;
                info!("Synced commands to guild {guild_id}");
            }
            None => {
                Command::set_global_commands(http, commands).await?;
                info!("Synced global commands");
            }
        }

        info!("{} is good to go!", ready.user.name);
        Ok(())
    }

    async fn command(
        &self,
        platform: &DiscordPlatform,
        cmd: &CommandInteraction,
    ) -> anyhow::Result<Option<Reply>> {
        let name = cmd.data.name.as_str();
        let Some(handler) = self.handlers.get(name) else {
            anyhow::bail!("no handler found for command: {name}");
        };
        debug!(command = name, user = %cmd.user.id, "running command");
        handler.run(platform, cmd).await.map(Some)
    }

    async fn component(
        &self,
        platform: &DiscordPlatform,
        cmp: &ComponentInteraction,
    ) -> anyhow::Result<Option<Reply>> {
        let Some(control) = Control::parse(&cmp.data.custom_id) else {
            debug!(custom_id = %cmp.data.custom_id, "ignoring unknown component");
            return Ok(None);
        };

        let actor = cmp.actor()?;
        let reply = match control {
            Control::Verify { role_id } => verify::verify(platform, &actor, role_id).await,
            Control::CreateTicket { support_role_id } => {
                tickets::create(platform, &self.state.store, &actor, support_role_id).await?
            }
            Control::CloseTicket { ticket_id } => {
                tickets::close(
                    platform,
                    &self.state.store,
                    &self.state.config,
                    &actor,
                    ticket_id,
                    CloseOrigin::Button,
                )
                .await?
            }
        };
        Ok(Some(reply))
    }
}

#[cfg(test)]
mod tests {
    use std::future;

    use super::*;

    #[tokio::test]
    async fn shutdown_signal_stops_a_running_gateway() {
        let gateway = future::pending::<Result<(), std::io::Error>>();
        let exit = run_until_shutdown(gateway, future::ready(())).await.unwrap();
        assert_eq!(exit, Exit::Requested);
    }

    #[tokio::test]
    async fn gateway_ending_by_itself_is_not_a_shutdown() {
        let gateway = future::ready(Ok::<_, std::io::Error>(()));
        let exit = run_until_shutdown(gateway, future::pending()).await.unwrap();
        assert_eq!(exit, Exit::Stopped);
    }

    #[tokio::test]
    async fn gateway_errors_are_reported() {
        let gateway = future::ready(Err(std::io::Error::other("invalid token")));
        let err = run_until_shutdown(gateway, future::pending())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Client error");
    }
}
