use std::borrow::Borrow;

use serenity::{all::*, async_trait};

use crate::{platform::Actor, reply::Reply};

#[async_trait]
pub trait RespondableInteraction: Send + Sync {
    async fn create(&self, http: &Http, reply: &Reply) -> anyhow::Result<()>;

    fn channel_id(&self) -> ChannelId;
    fn guild_id(&self) -> Option<GuildId>;
    fn user(&self) -> &User;
    fn member(&self) -> Option<&Member>;

    /// The invoking guild member, with the capabilities Discord resolved for
    /// this interaction.
    fn actor(&self) -> anyhow::Result<Actor> {
        let guild_id = self
            .guild_id()
            .ok_or_else(|| anyhow::anyhow!("this can only be used in a server"))?;
        let member = self
            .member()
            .ok_or_else(|| anyhow::anyhow!("missing member data for interaction"))?;
        Ok(Actor {
            guild_id,
            channel_id: self.channel_id(),
            user_id: self.user().id,
            name: self.user().name.clone(),
            roles: member.roles.clone(),
            permissions: member.permissions.unwrap_or_else(Permissions::empty),
        })
    }
}
macro_rules! implement_respondable_interaction {
    ($name:ident) => {
        #[async_trait]
        impl RespondableInteraction for $name {
            async fn create(&self, http: &Http, reply: &Reply) -> anyhow::Result<()> {
                Ok(self
                    .create_response(
                        http,
                        CreateInteractionResponse::Message(
                            CreateInteractionResponseMessage::new()
                                .content(&reply.content)
                                .ephemeral(reply.ephemeral),
                        ),
                    )
                    .await?)
            }

            fn channel_id(&self) -> ChannelId {
                self.channel_id
            }
            fn guild_id(&self) -> Option<GuildId> {
                self.guild_id
            }
            fn user(&self) -> &User {
                &self.user
            }
            fn member(&self) -> Option<&Member> {
                self.member.as_ref().map(|member| Borrow::<Member>::borrow(member))
            }
        }
    };
}
implement_respondable_interaction!(CommandInteraction);
implement_respondable_interaction!(ComponentInteraction);

pub fn interaction_to_respondable_interaction(
    interaction: &Interaction,
) -> Option<&dyn RespondableInteraction> {
    match interaction {
        Interaction::Command(cmd) => Some(cmd),
        Interaction::Component(cmp) => Some(cmp),
        _ => None,
    }
}

pub fn get_value<'a>(
    options: &'a [CommandDataOption],
    name: &str,
) -> Option<&'a CommandDataOptionValue> {
    options
        .iter()
        .find(|option| option.name == name)
        .map(|option| &option.value)
}

pub fn value_to_string(value: &CommandDataOptionValue) -> Option<String> {
    match value {
        CommandDataOptionValue::String(s) => Some(s.clone()),
        _ => None,
    }
}

pub fn value_to_integer(value: &CommandDataOptionValue) -> Option<i64> {
    match value {
        CommandDataOptionValue::Integer(i) => Some(*i),
        _ => None,
    }
}

pub fn value_to_user(value: &CommandDataOptionValue) -> Option<UserId> {
    match value {
        CommandDataOptionValue::User(user_id) => Some(*user_id),
        _ => None,
    }
}
