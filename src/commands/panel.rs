use std::sync::Arc;

use serenity::all::{CommandInteraction, CreateCommand, Permissions};

use crate::{
    commands::{CommandHandler, SharedState},
    constant, panels,
    platform::Platform,
    reply::Reply,
    util::RespondableInteraction as _,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Verify,
    Ticket,
}

/// `/create_verify_panel` and `/create_ticket_panel`
pub struct Handler {
    kind: PanelKind,
    state: Arc<SharedState>,
}
impl Handler {
    pub fn new(kind: PanelKind, state: Arc<SharedState>) -> Self {
        Self { kind, state }
    }
}

#[serenity::async_trait]
impl CommandHandler for Handler {
    fn name(&self) -> &str {
        match self.kind {
            PanelKind::Verify => constant::commands::CREATE_VERIFY_PANEL,
            PanelKind::Ticket => constant::commands::CREATE_TICKET_PANEL,
        }
    }

    fn command(&self) -> CreateCommand {
        let description = match self.kind {
            PanelKind::Verify => "Create a verification panel (admin only)",
            PanelKind::Ticket => "Create a ticket panel (admin only)",
        };
        CreateCommand::new(self.name())
            .description(description)
            .default_member_permissions(Permissions::MANAGE_GUILD)
    }

    async fn run(
        &self,
        platform: &dyn Platform,
        cmd: &CommandInteraction,
    ) -> anyhow::Result<Reply> {
        let actor = cmd.actor()?;
        let roles = &self.state.config.roles;
        match self.kind {
            PanelKind::Verify => panels::create_verify_panel(platform, roles, &actor).await,
            PanelKind::Ticket => panels::create_ticket_panel(platform, roles, &actor).await,
        }
    }
}
