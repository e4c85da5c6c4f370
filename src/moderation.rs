use serenity::all::{Mention, PermissionOverwrite, PermissionOverwriteType, Permissions, UserId};
use tracing::{info, instrument, warn};

use crate::{
    constant,
    platform::{Actor, OutgoingMessage, Platform, PlatformError},
    reply::Reply,
};

/// Member-management actions gated on a capability of the invoking member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sanction {
    Ban,
    Kick,
}
impl Sanction {
    fn required(self) -> Permissions {
        match self {
            Sanction::Ban => Permissions::BAN_MEMBERS,
            Sanction::Kick => Permissions::KICK_MEMBERS,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Sanction::Ban => "ban",
            Sanction::Kick => "kick",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Sanction::Ban => "Banned",
            Sanction::Kick => "Kicked",
        }
    }
}

/// The reason recorded in the audit log, naming the moderator
pub fn audit_reason(reason: Option<&str>, actor: &Actor) -> String {
    format!("{} (by {})", reason.unwrap_or(constant::NO_REASON), actor.name)
}

#[instrument(skip_all, fields(moderator = %actor.user_id, target = %target, kind = ?kind))]
pub async fn sanction(
    platform: &dyn Platform,
    actor: &Actor,
    kind: Sanction,
    target: UserId,
    reason: Option<&str>,
) -> Reply {
    let verb = kind.verb();
    if !actor.can(kind.required()) {
        return Reply::private(format!("You don't have permission to {verb} members."));
    }

    let audit_reason = audit_reason(reason, actor);
    let result = match kind {
        Sanction::Ban => platform.ban(actor.guild_id, target, &audit_reason).await,
        Sanction::Kick => platform.kick(actor.guild_id, target, &audit_reason).await,
    };

    match result {
        Ok(()) => {
            info!(reason = %audit_reason, "applied sanction");
            Reply::public(format!(
                "✅ {} {}. Reason: {}",
                kind.past_tense(),
                Mention::User(target),
                reason.unwrap_or(constant::NO_REASON)
            ))
        }
        Err(PlatformError::Forbidden) => {
            Reply::private(format!("I don't have permission to {verb} that member."))
        }
        Err(err) => {
            warn!(%err, "sanction failed");
            Reply::private(format!("Failed to {verb}: {err}"))
        }
    }
}

/// Posts `message` in the invoking channel as the bot.
#[instrument(skip_all, fields(moderator = %actor.user_id, channel = %actor.channel_id))]
pub async fn say(platform: &dyn Platform, actor: &Actor, message: &str) -> Reply {
    if !actor.can(Permissions::MANAGE_MESSAGES) {
        return Reply::private("You don't have permission to use this command.");
    }
    if message.trim().is_empty() {
        return Reply::private("There is nothing to say.");
    }

    match platform
        .send_message(actor.channel_id, OutgoingMessage::text(message))
        .await
    {
        Ok(()) => Reply::private("Message sent."),
        Err(PlatformError::Forbidden) => {
            Reply::private("I don't have permission to send messages in this channel.")
        }
        Err(err) => {
            warn!(%err, "say failed");
            Reply::private(format!("Failed to send message: {err}"))
        }
    }
}

/// Stops `@everyone` from sending messages in the invoking channel.
#[instrument(skip_all, fields(moderator = %actor.user_id, channel = %actor.channel_id))]
pub async fn lock(platform: &dyn Platform, actor: &Actor) -> Reply {
    if !actor.can(Permissions::MANAGE_CHANNELS) {
        return Reply::private("You don't have permission to lock channels.");
    }

    match platform
        .set_overwrite(actor.channel_id, lock_overwrite(actor))
        .await
    {
        Ok(()) => {
            info!("locked channel");
            Reply::public(format!("🔒 {} has been locked.", Mention::Channel(actor.channel_id)))
        }
        Err(PlatformError::Forbidden) => {
            Reply::private("I don't have permission to manage this channel.")
        }
        Err(err) => {
            warn!(%err, "lock failed");
            Reply::private(format!("Failed to lock channel: {err}"))
        }
    }
}

fn lock_overwrite(actor: &Actor) -> PermissionOverwrite {
    PermissionOverwrite {
        allow: Permissions::empty(),
        deny: Permissions::SEND_MESSAGES,
        kind: PermissionOverwriteType::Role(actor.guild_id.everyone_role()),
    }
}
