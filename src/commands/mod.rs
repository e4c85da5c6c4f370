use std::sync::Arc;

use serenity::all::{CommandInteraction, CreateCommand};

use crate::{config::Configuration, platform::Platform, reply::Reply, store::TicketStore};

pub mod close_ticket;
pub mod lock;
pub mod panel;
pub mod sanction;
pub mod say;

/// State shared by every command handler
pub struct SharedState {
    pub config: Arc<Configuration>,
    pub store: Arc<TicketStore>,
}

#[serenity::async_trait]
pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &str;
    /// The definition registered with Discord
    fn command(&self) -> CreateCommand;
    async fn run(&self, platform: &dyn Platform, cmd: &CommandInteraction)
    -> anyhow::Result<Reply>;
}
