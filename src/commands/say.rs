use serenity::all::{
    CommandInteraction, CommandOptionType, CreateCommand, CreateCommandOption, Permissions,
};

use crate::{
    commands::CommandHandler,
    constant, moderation,
    platform::Platform,
    reply::Reply,
    util::{self, RespondableInteraction as _},
};

pub struct Handler;

#[serenity::async_trait]
impl CommandHandler for Handler {
    fn name(&self) -> &str {
        constant::commands::SAY
    }

    fn command(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Make the bot post a message in this channel")
            .default_member_permissions(Permissions::MANAGE_MESSAGES)
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    constant::value::MESSAGE,
                    "What to say",
                )
                .required(true)
                .max_length(2000),
            )
    }

    async fn run(
        &self,
        platform: &dyn Platform,
        cmd: &CommandInteraction,
    ) -> anyhow::Result<Reply> {
        let message = util::get_value(&cmd.data.options, constant::value::MESSAGE)
            .and_then(util::value_to_string)
            .ok_or_else(|| anyhow::anyhow!("Missing message parameter"))?;

        let actor = cmd.actor()?;
        Ok(moderation::say(platform, &actor, &message).await)
    }
}
