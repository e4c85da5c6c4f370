use serenity::all::{
    CommandInteraction, CommandOptionType, CreateCommand, CreateCommandOption, Permissions,
};

use crate::{
    commands::CommandHandler,
    constant,
    moderation::{self, Sanction},
    platform::Platform,
    reply::Reply,
    util::{self, RespondableInteraction as _},
};

/// `/ban` and `/kick`
pub struct Handler {
    kind: Sanction,
}
impl Handler {
    pub fn new(kind: Sanction) -> Self {
        Self { kind }
    }
}

#[serenity::async_trait]
impl CommandHandler for Handler {
    fn name(&self) -> &str {
        match self.kind {
            Sanction::Ban => constant::commands::BAN,
            Sanction::Kick => constant::commands::KICK,
        }
    }

    fn command(&self) -> CreateCommand {
        let (description, member, required) = match self.kind {
            Sanction::Ban => ("Ban a member", "Member to ban", Permissions::BAN_MEMBERS),
            Sanction::Kick => ("Kick a member", "Member to kick", Permissions::KICK_MEMBERS),
        };
        CreateCommand::new(self.name())
            .description(description)
            .default_member_permissions(required)
            .add_option(
                CreateCommandOption::new(CommandOptionType::User, constant::value::MEMBER, member)
                    .required(true),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    constant::value::REASON,
                    "Optional reason",
                )
                .required(false),
            )
    }

    async fn run(
        &self,
        platform: &dyn Platform,
        cmd: &CommandInteraction,
    ) -> anyhow::Result<Reply> {
        let options = &cmd.data.options;

        let target = util::get_value(options, constant::value::MEMBER)
            .and_then(util::value_to_user)
            .ok_or_else(|| anyhow::anyhow!("Missing member parameter"))?;
        let reason = util::get_value(options, constant::value::REASON)
            .and_then(util::value_to_string)
            .filter(|reason| !reason.trim().is_empty());

        let actor = cmd.actor()?;
        Ok(moderation::sanction(platform, &actor, self.kind, target, reason.as_deref()).await)
    }
}
