use std::{collections::HashMap, sync::Arc};

use serenity::{
    all::{
        ButtonStyle, Cache, Channel, ChannelId, ChannelType, Colour, CreateActionRow,
        CreateButton, CreateChannel, CreateEmbed, CreateMessage, EditChannel, EditRole, GuildId,
        Http, PermissionOverwrite, Role, RoleId, UserId,
    },
    model::ModelError,
};

use super::{
    ChannelInfo, Embed, NewChannel, OutgoingMessage, PanelColour, Platform, PlatformError,
    PlatformResult, RoleInfo,
};
use crate::controls::Control;

/// [`Platform`] backed by the Discord REST API. Role lookups are answered
/// from the gateway cache when the guild is in it.
pub struct DiscordPlatform {
    http: Arc<Http>,
    cache: Arc<Cache>,
    bot_id: UserId,
}
impl DiscordPlatform {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>) -> Self {
        let bot_id = cache.current_user().id;
        Self { http, cache, bot_id }
    }

    async fn roles(&self, guild_id: GuildId) -> PlatformResult<HashMap<RoleId, Role>> {
        // the cache guard is not Send, so copy out before any await
        let cached = self.cache.guild(guild_id).map(|guild| guild.roles.clone());
        match cached {
            Some(roles) => Ok(roles),
            None => Ok(guild_id.roles(&self.http).await?),
        }
    }
}

impl From<serenity::Error> for PlatformError {
    fn from(err: serenity::Error) -> Self {
        let status = match &err {
            serenity::Error::Http(http) => http.status_code().map(|status| status.as_u16()),
            _ => None,
        };
        let denied_by_model = matches!(
            err,
            serenity::Error::Model(ModelError::InvalidPermissions { .. } | ModelError::Hierarchy)
        );

        match status {
            Some(403) => PlatformError::Forbidden,
            Some(404) => PlatformError::NotFound,
            _ if denied_by_model => PlatformError::Forbidden,
            _ => PlatformError::Other(err.into()),
        }
    }
}

fn not_found_as_none<T>(result: PlatformResult<T>) -> PlatformResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(PlatformError::NotFound) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Lowest position first, so duplicates resolve the same way every time
fn first_named<'a>(
    roles: impl IntoIterator<Item = (RoleId, &'a str, u16)>,
    name: &str,
) -> Option<RoleInfo> {
    roles
        .into_iter()
        .filter(|(_, role_name, _)| *role_name == name)
        .min_by_key(|(id, _, position)| (*position, *id))
        .map(|(id, name, _)| RoleInfo {
            id,
            name: name.to_string(),
        })
}

fn to_embed(embed: Embed) -> CreateEmbed {
    let colour = match embed.colour {
        PanelColour::Green => Colour::DARK_GREEN,
        PanelColour::Blue => Colour::BLUE,
    };
    embed.fields.into_iter().fold(
        CreateEmbed::new()
            .title(embed.title)
            .description(embed.description)
            .colour(colour),
        |builder, (name, value)| builder.field(name, value, false),
    )
}

fn to_button(control: &Control) -> CreateButton {
    let (label, style) = match control {
        Control::Verify { .. } => ("Verify", ButtonStyle::Success),
        Control::CreateTicket { .. } => ("Create Ticket", ButtonStyle::Primary),
        Control::CloseTicket { .. } => ("Close Ticket", ButtonStyle::Danger),
    };
    CreateButton::new(control.custom_id())
        .label(label)
        .style(style)
}

#[serenity::async_trait]
impl Platform for DiscordPlatform {
    fn bot_id(&self) -> UserId {
        self.bot_id
    }

    async fn role(&self, guild_id: GuildId, role_id: RoleId) -> PlatformResult<Option<RoleInfo>> {
        let roles = self.roles(guild_id).await?;
        Ok(roles.get(&role_id).map(|role| RoleInfo {
            id: role.id,
            name: role.name.clone(),
        }))
    }

    async fn role_by_name(
        &self,
        guild_id: GuildId,
        name: &str,
    ) -> PlatformResult<Option<RoleInfo>> {
        let roles = self.roles(guild_id).await?;
        Ok(first_named(
            roles
                .values()
                .map(|role| (role.id, role.name.as_str(), role.position)),
            name,
        ))
    }

    async fn create_role(
        &self,
        guild_id: GuildId,
        name: &str,
        reason: &str,
    ) -> PlatformResult<RoleInfo> {
        let role = guild_id
            .create_role(
                &self.http,
                EditRole::new().name(name).audit_log_reason(reason),
            )
            .await?;
        Ok(RoleInfo {
            id: role.id,
            name: role.name,
        })
    }

    async fn add_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
        reason: &str,
    ) -> PlatformResult<()> {
        Ok(self
            .http
            .add_member_role(guild_id, user_id, role_id, Some(reason))
            .await?)
    }

    async fn channel(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> PlatformResult<Option<ChannelInfo>> {
        let channel = not_found_as_none(
            channel_id
                .to_channel(&self.http)
                .await
                .map_err(PlatformError::from),
        )?;
        Ok(match channel {
            Some(Channel::Guild(channel)) if channel.guild_id == guild_id => Some(ChannelInfo {
                id: channel.id,
                category: match channel.kind {
                    ChannelType::Text => channel.parent_id,
                    _ => None,
                },
                name: channel.name,
            }),
            _ => None,
        })
    }

    async fn create_channel(
        &self,
        guild_id: GuildId,
        channel: NewChannel,
    ) -> PlatformResult<ChannelInfo> {
        let mut builder = CreateChannel::new(channel.name)
            .kind(ChannelType::Text)
            .permissions(channel.overwrites)
            .audit_log_reason(&channel.reason);
        if let Some(category) = channel.category {
            builder = builder.category(category);
        }

        let created = guild_id.create_channel(&self.http, builder).await?;
        Ok(ChannelInfo {
            id: created.id,
            category: created.parent_id,
            name: created.name,
        })
    }

    async fn edit_channel(
        &self,
        channel_id: ChannelId,
        name: &str,
        topic: &str,
        reason: &str,
    ) -> PlatformResult<()> {
        channel_id
            .edit(
                &self.http,
                EditChannel::new()
                    .name(name)
                    .topic(topic)
                    .audit_log_reason(reason),
            )
            .await?;
        Ok(())
    }

    async fn set_overwrite(
        &self,
        channel_id: ChannelId,
        overwrite: PermissionOverwrite,
    ) -> PlatformResult<()> {
        Ok(channel_id.create_permission(&self.http, overwrite).await?)
    }

    async fn send_message(
        &self,
        channel_id: ChannelId,
        message: OutgoingMessage,
    ) -> PlatformResult<()> {
        let mut builder = CreateMessage::new();
        if let Some(content) = message.content {
            builder = builder.content(content);
        }
        if let Some(embed) = message.embed {
            builder = builder.embed(to_embed(embed));
        }
        if let Some(control) = &message.control {
            builder = builder.components(vec![CreateActionRow::Buttons(vec![to_button(control)])]);
        }

        channel_id.send_message(&self.http, builder).await?;
        Ok(())
    }

    async fn ban(&self, guild_id: GuildId, user_id: UserId, reason: &str) -> PlatformResult<()> {
        Ok(guild_id
            .ban_with_reason(&self.http, user_id, 0, reason)
            .await?)
    }

    async fn kick(&self, guild_id: GuildId, user_id: UserId, reason: &str) -> PlatformResult<()> {
        Ok(guild_id
            .kick_with_reason(&self.http, user_id, reason)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowest_positioned_role_wins_a_name_clash() {
        let roles = [
            (RoleId::new(30), "Support", 4),
            (RoleId::new(10), "Member", 1),
            (RoleId::new(20), "Support", 2),
            (RoleId::new(40), "Support", 2),
        ];

        let support = first_named(roles, "Support").unwrap();
        assert_eq!(support.id, RoleId::new(20));
        assert_eq!(support.name, "Support");
        assert_eq!(first_named(roles, "support"), None);
        assert_eq!(first_named([], "Support"), None);
    }
}
