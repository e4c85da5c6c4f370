use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use serenity::all::{ChannelId, GuildId, PermissionOverwrite, Permissions, RoleId, UserId};

use crate::platform::{
    Actor, ChannelInfo, NewChannel, OutgoingMessage, Platform, PlatformError, PlatformResult,
    RoleInfo,
};

pub const GUILD: GuildId = GuildId::new(1);
pub const BOT: UserId = UserId::new(999);
pub const PANEL_CHANNEL: ChannelId = ChannelId::new(500);
pub const PANEL_CATEGORY: ChannelId = ChannelId::new(400);

/// Operations a test can make fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    CreateRole,
    AddRole,
    CreateChannel,
    EditChannel,
    SetOverwrite,
    SendMessage,
    Ban,
    Kick,
}

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Forbidden,
    Other,
}

#[derive(Default)]
pub struct Recorded {
    pub roles: Vec<RoleInfo>,
    pub member_roles: HashMap<UserId, HashSet<RoleId>>,
    pub channels: HashMap<ChannelId, ChannelInfo>,
    pub created_channels: Vec<NewChannel>,
    pub edits: Vec<(ChannelId, String, String)>,
    pub overwrites: Vec<(ChannelId, PermissionOverwrite)>,
    pub sent: Vec<(ChannelId, OutgoingMessage)>,
    pub bans: Vec<(UserId, String)>,
    pub kicks: Vec<(UserId, String)>,
    failures: HashMap<Op, Failure>,
    next_id: u64,
}
impl Recorded {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        10_000 + self.next_id
    }

    fn check(&self, op: Op) -> PlatformResult<()> {
        match self.failures.get(&op) {
            Some(Failure::Forbidden) => Err(PlatformError::Forbidden),
            Some(Failure::Other) => Err(PlatformError::Other(anyhow::anyhow!("{op:?} exploded"))),
            None => Ok(()),
        }
    }

    /// Platform calls that changed something
    pub fn mutations(&self) -> usize {
        self.created_channels.len()
            + self.edits.len()
            + self.overwrites.len()
            + self.sent.len()
            + self.bans.len()
            + self.kicks.len()
            + self.member_roles.values().map(HashSet::len).sum::<usize>()
    }
}

/// In-memory single-guild [`Platform`] that records every call
pub struct FakePlatform {
    pub recorded: Mutex<Recorded>,
}

impl FakePlatform {
    pub fn new() -> Self {
        let platform = Self {
            recorded: Mutex::new(Recorded::default()),
        };
        platform.add_channel(PANEL_CHANNEL, "support", Some(PANEL_CATEGORY));
        platform
    }

    pub fn add_role(&self, id: u64, name: &str) -> RoleId {
        let role = RoleInfo {
            id: RoleId::new(id),
            name: name.to_string(),
        };
        self.recorded.lock().unwrap().roles.push(role);
        RoleId::new(id)
    }

    pub fn add_channel(&self, id: ChannelId, name: &str, category: Option<ChannelId>) {
        self.recorded.lock().unwrap().channels.insert(
            id,
            ChannelInfo {
                id,
                name: name.to_string(),
                category,
            },
        );
    }

    pub fn delete_channel(&self, id: ChannelId) {
        self.recorded.lock().unwrap().channels.remove(&id);
    }

    pub fn fail(&self, op: Op, failure: Failure) {
        self.recorded.lock().unwrap().failures.insert(op, failure);
    }

    pub fn recorded(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap()
    }
}

pub fn actor(user_id: u64, permissions: Permissions) -> Actor {
    Actor {
        guild_id: GUILD,
        channel_id: PANEL_CHANNEL,
        user_id: UserId::new(user_id),
        name: format!("User {user_id}"),
        roles: vec![],
        permissions,
    }
}

#[serenity::async_trait]
impl Platform for FakePlatform {
    fn bot_id(&self) -> UserId {
        BOT
    }

    async fn role(&self, _guild_id: GuildId, role_id: RoleId) -> PlatformResult<Option<RoleInfo>> {
        let recorded = self.recorded();
        Ok(recorded.roles.iter().find(|r| r.id == role_id).cloned())
    }

    async fn role_by_name(
        &self,
        _guild_id: GuildId,
        name: &str,
    ) -> PlatformResult<Option<RoleInfo>> {
        let recorded = self.recorded();
        Ok(recorded.roles.iter().find(|r| r.name == name).cloned())
    }

    async fn create_role(
        &self,
        _guild_id: GuildId,
        name: &str,
        _reason: &str,
    ) -> PlatformResult<RoleInfo> {
        let mut recorded = self.recorded();
        recorded.check(Op::CreateRole)?;
        let role = RoleInfo {
            id: RoleId::new(recorded.next_id()),
            name: name.to_string(),
        };
        recorded.roles.push(role.clone());
        Ok(role)
    }

    async fn add_role(
        &self,
        _guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
        _reason: &str,
    ) -> PlatformResult<()> {
        let mut recorded = self.recorded();
        recorded.check(Op::AddRole)?;
        recorded
            .member_roles
            .entry(user_id)
            .or_default()
            .insert(role_id);
        Ok(())
    }

    async fn channel(
        &self,
        _guild_id: GuildId,
        channel_id: ChannelId,
    ) -> PlatformResult<Option<ChannelInfo>> {
        Ok(self.recorded().channels.get(&channel_id).cloned())
    }

    async fn create_channel(
        &self,
        _guild_id: GuildId,
        channel: NewChannel,
    ) -> PlatformResult<ChannelInfo> {
        // let concurrent handlers interleave here, like a real request would
        tokio::task::yield_now().await;

        let mut recorded = self.recorded();
        recorded.check(Op::CreateChannel)?;
        let info = ChannelInfo {
            id: ChannelId::new(recorded.next_id()),
            name: channel.name.clone(),
            category: channel.category,
        };
        recorded.channels.insert(info.id, info.clone());
        recorded.created_channels.push(channel);
        Ok(info)
    }

    async fn edit_channel(
        &self,
        channel_id: ChannelId,
        name: &str,
        topic: &str,
        _reason: &str,
    ) -> PlatformResult<()> {
        tokio::task::yield_now().await;

        let mut recorded = self.recorded();
        recorded.check(Op::EditChannel)?;
        let channel = recorded
            .channels
            .get_mut(&channel_id)
            .ok_or(PlatformError::NotFound)?;
        channel.name = name.to_string();
        recorded
            .edits
            .push((channel_id, name.to_string(), topic.to_string()));
        Ok(())
    }

    async fn set_overwrite(
        &self,
        channel_id: ChannelId,
        overwrite: PermissionOverwrite,
    ) -> PlatformResult<()> {
        let mut recorded = self.recorded();
        recorded.check(Op::SetOverwrite)?;
        recorded.overwrites.push((channel_id, overwrite));
        Ok(())
    }

    async fn send_message(
        &self,
        channel_id: ChannelId,
        message: OutgoingMessage,
    ) -> PlatformResult<()> {
        tokio::task::yield_now().await;

        let mut recorded = self.recorded();
        recorded.check(Op::SendMessage)?;
        recorded.sent.push((channel_id, message));
        Ok(())
    }

    async fn ban(&self, _guild_id: GuildId, user_id: UserId, reason: &str) -> PlatformResult<()> {
        let mut recorded = self.recorded();
        recorded.check(Op::Ban)?;
        recorded.bans.push((user_id, reason.to_string()));
        Ok(())
    }

    async fn kick(&self, _guild_id: GuildId, user_id: UserId, reason: &str) -> PlatformResult<()> {
        let mut recorded = self.recorded();
        recorded.check(Op::Kick)?;
        recorded.kicks.push((user_id, reason.to_string()));
        Ok(())
    }
}
