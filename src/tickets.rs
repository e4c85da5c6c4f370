use serenity::all::{
    Mention, PermissionOverwrite, PermissionOverwriteType, Permissions, RoleId, UserId,
};
use tracing::{info, instrument, warn};

use crate::{
    config::{Configuration, RevokeTarget},
    constant,
    controls::Control,
    platform::{Actor, NewChannel, OutgoingMessage, Platform, PlatformError},
    reply::Reply,
    store::{TicketId, TicketRecord, TicketStore},
};

/// `ticket-<id>-<name>`, lower-cased with spaces turned into hyphens
pub fn channel_name(ticket_id: TicketId, requester: &str) -> String {
    format!("ticket-{ticket_id}-{requester}")
        .to_lowercase()
        .replace(' ', "-")
}

fn participant() -> Permissions {
    Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES | Permissions::READ_MESSAGE_HISTORY
}

fn member_overwrite(user_id: UserId, allow: Permissions, deny: Permissions) -> PermissionOverwrite {
    PermissionOverwrite {
        allow,
        deny,
        kind: PermissionOverwriteType::Member(user_id),
    }
}

/// Hidden from everyone except the requester, the bot and the support role.
fn ticket_overwrites(
    actor: &Actor,
    bot_id: UserId,
    support_role_id: Option<RoleId>,
) -> Vec<PermissionOverwrite> {
    let mut overwrites = vec![
        PermissionOverwrite {
            allow: Permissions::empty(),
            deny: Permissions::VIEW_CHANNEL,
            kind: PermissionOverwriteType::Role(actor.guild_id.everyone_role()),
        },
        member_overwrite(actor.user_id, participant(), Permissions::empty()),
        member_overwrite(bot_id, participant(), Permissions::empty()),
    ];
    if let Some(role_id) = support_role_id {
        overwrites.push(PermissionOverwrite {
            allow: participant(),
            deny: Permissions::empty(),
            kind: PermissionOverwriteType::Role(role_id),
        });
    }
    overwrites
}

/// Opens a private ticket channel for the member who clicked **Create Ticket**.
///
/// The id is consumed even if the channel cannot be created; the record is
/// only written once the channel exists.
#[instrument(skip_all, fields(user = %actor.user_id))]
pub async fn create(
    platform: &dyn Platform,
    store: &TicketStore,
    actor: &Actor,
    support_role_id: Option<RoleId>,
) -> anyhow::Result<Reply> {
    let ticket_id = store.allocate_id().await?;

    // the role may have been deleted since the panel was posted
    let support_role_id = match support_role_id {
        Some(role_id) => platform
            .role(actor.guild_id, role_id)
            .await?
            .map(|role| role.id),
        None => None,
    };
    let category = platform
        .channel(actor.guild_id, actor.channel_id)
        .await?
        .and_then(|channel| channel.category);

    let new_channel = NewChannel {
        name: channel_name(ticket_id, &actor.name),
        category,
        overwrites: ticket_overwrites(actor, platform.bot_id(), support_role_id),
        reason: "Ticket created".to_string(),
    };
    let channel = match platform.create_channel(actor.guild_id, new_channel).await {
        Ok(channel) => channel,
        Err(PlatformError::Forbidden) => {
            warn!(ticket_id, "not allowed to create ticket channel");
            return Ok(Reply::private("I don't have permission to create channels."));
        }
        Err(err) => {
            warn!(ticket_id, %err, "failed to create ticket channel");
            return Ok(Reply::private(format!("Failed to create ticket: {err}")));
        }
    };

    store
        .put(
            ticket_id,
            TicketRecord {
                guild_id: actor.guild_id,
                channel_id: channel.id,
                owner_id: actor.user_id,
            },
        )
        .await?;
    info!(ticket_id, channel = %channel.id, "opened ticket");

    let welcome = OutgoingMessage {
        content: Some(format!(
            "Hello {}! A staff member will be with you shortly. Ticket ID: **{ticket_id}**",
            Mention::User(actor.user_id)
        )),
        embed: None,
        control: Some(Control::CloseTicket { ticket_id }),
    };
    if let Err(err) = platform.send_message(channel.id, welcome).await {
        warn!(ticket_id, %err, "failed to post ticket welcome message");
    }

    Ok(Reply::private(format!(
        "✅ Created ticket: {}",
        Mention::Channel(channel.id)
    )))
}

/// Where a close request came from; the two differ only in wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOrigin {
    Button,
    Command,
}
impl CloseOrigin {
    fn not_found(self) -> &'static str {
        match self {
            CloseOrigin::Button => "Ticket not found or already closed.",
            CloseOrigin::Command => "Ticket not found.",
        }
    }

    fn not_authorized(self) -> &'static str {
        match self {
            CloseOrigin::Button => {
                "Only the ticket owner, support staff, or an admin may close this ticket."
            }
            CloseOrigin::Command => "You don't have permission to close this ticket.",
        }
    }

    fn closed(self, ticket_id: TicketId) -> String {
        match self {
            CloseOrigin::Button => "Ticket closed.".to_string(),
            CloseOrigin::Command => format!("Ticket {ticket_id} closed."),
        }
    }
}

async fn may_close(
    platform: &dyn Platform,
    config: &Configuration,
    actor: &Actor,
    record: &TicketRecord,
) -> anyhow::Result<bool> {
    if actor.user_id == record.owner_id || actor.can(Permissions::MANAGE_GUILD) {
        return Ok(true);
    }
    let support_role = platform
        .role_by_name(actor.guild_id, &config.roles.support_role_name)
        .await?;
    Ok(support_role.is_some_and(|role| actor.has_role(role.id)))
}

/// The ticket's channel is gone. Only the command form drops the record;
/// a button can only be clicked inside a channel that still exists.
async fn channel_gone(
    store: &TicketStore,
    ticket_id: TicketId,
    origin: CloseOrigin,
) -> anyhow::Result<Reply> {
    if origin == CloseOrigin::Command {
        store.remove(ticket_id).await?;
        info!("dropped ticket whose channel no longer exists");
    }
    Ok(Reply::private("Ticket channel not found."))
}

/// Closes a ticket: renames and locks its channel, then stops tracking it.
/// The channel itself is kept.
///
/// The ticket is claimed in the store for the duration, so of two overlapping
/// requests only one acts and the other sees it as already closed.
#[instrument(skip_all, fields(user = %actor.user_id, ticket_id = ticket_id, origin = ?origin))]
pub async fn close(
    platform: &dyn Platform,
    store: &TicketStore,
    config: &Configuration,
    actor: &Actor,
    ticket_id: TicketId,
    origin: CloseOrigin,
) -> anyhow::Result<Reply> {
    let Some(record) = store.claim(ticket_id, actor.guild_id).await else {
        return Ok(Reply::private(origin.not_found()));
    };

    let reply = close_claimed(platform, store, config, actor, ticket_id, record, origin).await;
    // no-op if the record was removed
    store.release(ticket_id).await;
    reply
}

async fn close_claimed(
    platform: &dyn Platform,
    store: &TicketStore,
    config: &Configuration,
    actor: &Actor,
    ticket_id: TicketId,
    record: TicketRecord,
    origin: CloseOrigin,
) -> anyhow::Result<Reply> {
    let Some(channel) = platform
        .channel(record.guild_id, record.channel_id)
        .await?
    else {
        return channel_gone(store, ticket_id, origin).await;
    };

    if !may_close(platform, config, actor, &record).await? {
        return Ok(Reply::private(origin.not_authorized()));
    }

    if let Err(err) = platform
        .send_message(
            channel.id,
            OutgoingMessage::text("Ticket will be closed in 5 seconds..."),
        )
        .await
    {
        warn!(%err, "failed to announce ticket closure");
    }

    let closed_name = format!("{}{}", constant::CLOSED_PREFIX, channel.name);
    match platform
        .edit_channel(
            channel.id,
            &closed_name,
            constant::CLOSED_TOPIC,
            "Ticket closed",
        )
        .await
    {
        Ok(()) => {}
        Err(PlatformError::Forbidden) => {
            return Ok(Reply::private(
                "I don't have permission to manage this ticket's channel.",
            ));
        }
        Err(PlatformError::NotFound) => return channel_gone(store, ticket_id, origin).await,
        Err(err) => {
            warn!(%err, "failed to close ticket");
            return Ok(Reply::private(format!("Failed to close ticket: {err}")));
        }
    }

    if store.remove(ticket_id).await?.is_none() {
        anyhow::bail!("ticket {ticket_id} was untracked while being closed");
    }
    info!(channel = %channel.id, "closed ticket");

    let revoked = match config.tickets.revoke_on_close {
        RevokeTarget::Closer => actor.user_id,
        RevokeTarget::Owner => record.owner_id,
    };
    let restrictions = [
        member_overwrite(
            revoked,
            Permissions::empty(),
            Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES,
        ),
        member_overwrite(
            platform.bot_id(),
            Permissions::VIEW_CHANNEL,
            Permissions::SEND_MESSAGES,
        ),
    ];
    for overwrite in restrictions {
        if let Err(err) = platform.set_overwrite(channel.id, overwrite).await {
            warn!(%err, "failed to lock closed ticket");
        }
    }

    Ok(Reply::private(origin.closed(ticket_id)))
}
