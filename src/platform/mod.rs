//! The slice of the chat platform the bot's behaviour is written against.
//!
//! Everything here is expressed in plain ids and small value types so the
//! verification, ticket and moderation flows can run without a gateway
//! connection. [`discord::DiscordPlatform`] is the real implementation.

use serenity::all::{ChannelId, GuildId, PermissionOverwrite, Permissions, RoleId, UserId};

use crate::controls::Control;

pub mod discord;

pub use discord::DiscordPlatform;

/// Why a platform call failed.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The bot itself is not allowed to do this.
    #[error("missing permissions")]
    Forbidden,
    /// The referenced object no longer exists.
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PlatformResult<T> = Result<T, PlatformError>;

/// The member behind an interaction, as reported by the platform with that
/// interaction. Capabilities are read fresh for every interaction.
#[derive(Debug, Clone)]
pub struct Actor {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub name: String,
    pub roles: Vec<RoleId>,
    pub permissions: Permissions,
}
impl Actor {
    /// Whether the actor holds `required`; administrators hold everything.
    pub fn can(&self, required: Permissions) -> bool {
        self.permissions.administrator() || self.permissions.contains(required)
    }

    pub fn has_role(&self, role_id: RoleId) -> bool {
        self.roles.contains(&role_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleInfo {
    pub id: RoleId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: String,
    /// Category the channel sits in, only set for text channels
    pub category: Option<ChannelId>,
}

/// Embed colours used by panels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelColour {
    Green,
    Blue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub colour: PanelColour,
    pub fields: Vec<(String, String)>,
}

/// A message posted into a channel, optionally carrying an embed and a control
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub embed: Option<Embed>,
    pub control: Option<Control>,
}
impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }
}

/// Channel creation parameters
#[derive(Debug, Clone)]
pub struct NewChannel {
    pub name: String,
    pub category: Option<ChannelId>,
    pub overwrites: Vec<PermissionOverwrite>,
    pub reason: String,
}

#[serenity::async_trait]
pub trait Platform: Send + Sync {
    /// The bot's own user
    fn bot_id(&self) -> UserId;

    async fn role(&self, guild_id: GuildId, role_id: RoleId) -> PlatformResult<Option<RoleInfo>>;
    async fn role_by_name(&self, guild_id: GuildId, name: &str)
    -> PlatformResult<Option<RoleInfo>>;
    async fn create_role(&self, guild_id: GuildId, name: &str, reason: &str)
    -> PlatformResult<RoleInfo>;
    async fn add_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
        reason: &str,
    ) -> PlatformResult<()>;

    /// Looks up a channel of `guild_id`; channels of other guilds are reported as absent.
    async fn channel(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> PlatformResult<Option<ChannelInfo>>;
    async fn create_channel(&self, guild_id: GuildId, channel: NewChannel)
    -> PlatformResult<ChannelInfo>;
    async fn edit_channel(
        &self,
        channel_id: ChannelId,
        name: &str,
        topic: &str,
        reason: &str,
    ) -> PlatformResult<()>;
    async fn set_overwrite(
        &self,
        channel_id: ChannelId,
        overwrite: PermissionOverwrite,
    ) -> PlatformResult<()>;
    async fn send_message(
        &self,
        channel_id: ChannelId,
        message: OutgoingMessage,
    ) -> PlatformResult<()>;

    async fn ban(&self, guild_id: GuildId, user_id: UserId, reason: &str) -> PlatformResult<()>;
    async fn kick(&self, guild_id: GuildId, user_id: UserId, reason: &str) -> PlatformResult<()>;
}
