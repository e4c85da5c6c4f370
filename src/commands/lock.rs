use serenity::all::{CommandInteraction, CreateCommand, Permissions};

use crate::{
    commands::CommandHandler, constant, moderation, platform::Platform, reply::Reply,
    util::RespondableInteraction as _,
};

pub struct Handler;

#[serenity::async_trait]
impl CommandHandler for Handler {
    fn name(&self) -> &str {
        constant::commands::LOCK
    }

    fn command(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Stop everyone from sending messages in this channel")
            .default_member_permissions(Permissions::MANAGE_CHANNELS)
    }

    async fn run(
        &self,
        platform: &dyn Platform,
        cmd: &CommandInteraction,
    ) -> anyhow::Result<Reply> {
        let actor = cmd.actor()?;
        Ok(moderation::lock(platform, &actor).await)
    }
}
