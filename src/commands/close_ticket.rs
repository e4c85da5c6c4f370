use std::sync::Arc;

use serenity::all::{CommandInteraction, CommandOptionType, CreateCommand, CreateCommandOption};

use crate::{
    commands::{CommandHandler, SharedState},
    constant,
    platform::Platform,
    reply::Reply,
    tickets::{self, CloseOrigin},
    util::{self, RespondableInteraction as _},
};

pub struct Handler {
    state: Arc<SharedState>,
}
impl Handler {
    pub fn new(state: Arc<SharedState>) -> Self {
        Self { state }
    }
}

#[serenity::async_trait]
impl CommandHandler for Handler {
    fn name(&self) -> &str {
        constant::commands::CLOSE_TICKET
    }

    fn command(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Close an open ticket by ID (staff or owner)")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Integer,
                    constant::value::TICKET_ID,
                    "ID of the ticket to close",
                )
                .required(true)
                .min_int_value(1),
            )
    }

    async fn run(
        &self,
        platform: &dyn Platform,
        cmd: &CommandInteraction,
    ) -> anyhow::Result<Reply> {
        let ticket_id = util::get_value(&cmd.data.options, constant::value::TICKET_ID)
            .and_then(util::value_to_integer)
            .ok_or_else(|| anyhow::anyhow!("Missing ticket_id parameter"))?;
        let Ok(ticket_id) = u64::try_from(ticket_id) else {
            return Ok(Reply::private("Ticket not found."));
        };

        let actor = cmd.actor()?;
        tickets::close(
            platform,
            &self.state.store,
            &self.state.config,
            &actor,
            ticket_id,
            CloseOrigin::Command,
        )
        .await
    }
}
