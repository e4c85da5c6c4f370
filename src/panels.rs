use serenity::all::{Mention, Permissions};
use tracing::{info, instrument, warn};

use crate::{
    config::Roles,
    controls::Control,
    platform::{Actor, Embed, OutgoingMessage, PanelColour, Platform, PlatformError},
    reply::Reply,
};

const ADMIN_ONLY: &str = "You must be a server admin to use this.";

fn send_failed(err: PlatformError) -> Reply {
    match err {
        PlatformError::Forbidden => {
            Reply::private("I don't have permission to post in this channel.")
        }
        err => {
            warn!(%err, "failed to post panel");
            Reply::private(format!("Failed to create panel: {err}"))
        }
    }
}

/// Posts a verification panel, creating the verification role if the guild
/// has none yet.
#[instrument(skip_all, fields(user = %actor.user_id, channel = %actor.channel_id))]
pub async fn create_verify_panel(
    platform: &dyn Platform,
    roles: &Roles,
    actor: &Actor,
) -> anyhow::Result<Reply> {
    if !actor.can(Permissions::MANAGE_GUILD) {
        return Ok(Reply::private(ADMIN_ONLY));
    }

    let role_name = &roles.verify_role_name;
    let role = match platform.role_by_name(actor.guild_id, role_name).await? {
        Some(role) => role,
        None => match platform
            .create_role(actor.guild_id, role_name, "Create verify role")
            .await
        {
            Ok(role) => {
                info!(role = %role.id, "created verification role");
                role
            }
            Err(PlatformError::Forbidden) => {
                return Ok(Reply::private(format!(
                    "I cannot create the verification role; please create a role named '{role_name}' or give me permissions."
                )));
            }
            Err(err) => return Err(err.into()),
        },
    };

    let panel = OutgoingMessage {
        content: None,
        embed: Some(Embed {
            title: "Server Verification".to_string(),
            description: "Click **Verify** to get access to the server.".to_string(),
            colour: PanelColour::Green,
            fields: vec![],
        }),
        control: Some(Control::Verify { role_id: role.id }),
    };
    if let Err(err) = platform.send_message(actor.channel_id, panel).await {
        return Ok(send_failed(err));
    }

    info!(role = %role.id, "posted verification panel");
    Ok(Reply::private("Verification panel created."))
}

/// Posts a ticket panel bound to the support role, if the guild has one.
#[instrument(skip_all, fields(user = %actor.user_id, channel = %actor.channel_id))]
pub async fn create_ticket_panel(
    platform: &dyn Platform,
    roles: &Roles,
    actor: &Actor,
) -> anyhow::Result<Reply> {
    if !actor.can(Permissions::MANAGE_GUILD) {
        return Ok(Reply::private(ADMIN_ONLY));
    }

    let role = platform
        .role_by_name(actor.guild_id, &roles.support_role_name)
        .await?;
    let role_field = match &role {
        Some(role) => Mention::Role(role.id).to_string(),
        None => format!(
            "No role named '{}' found. Create one for staff access",
            roles.support_role_name
        ),
    };

    let panel = OutgoingMessage {
        content: None,
        embed: Some(Embed {
            title: "Support Tickets".to_string(),
            description: "Click **Create Ticket** to open a private support channel.".to_string(),
            colour: PanelColour::Blue,
            fields: vec![("Support Role".to_string(), role_field)],
        }),
        control: Some(Control::CreateTicket {
            support_role_id: role.map(|role| role.id),
        }),
    };
    if let Err(err) = platform.send_message(actor.channel_id, panel).await {
        return Ok(send_failed(err));
    }

    info!("posted ticket panel");
    Ok(Reply::private("Ticket panel created."))
}
