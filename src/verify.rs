use serenity::all::RoleId;
use tracing::{info, instrument, warn};

use crate::{
    platform::{Actor, Platform, PlatformError},
    reply::Reply,
};

/// Grants the panel's role to the member who clicked **Verify**.
#[instrument(skip_all, fields(user = %actor.user_id, role = %role_id))]
pub async fn verify(platform: &dyn Platform, actor: &Actor, role_id: RoleId) -> Reply {
    let role = match platform.role(actor.guild_id, role_id).await {
        Ok(Some(role)) => role,
        Ok(None) => return Reply::private("Verification role not found. Contact an admin."),
        Err(err) => return failed(err),
    };

    if actor.has_role(role.id) {
        return Reply::private("You are already verified.");
    }

    match platform
        .add_role(actor.guild_id, actor.user_id, role.id, "User verified via panel")
        .await
    {
        Ok(()) => {
            info!(role = %role.name, "verified member");
            Reply::private(format!("✅ You have been given the **{}** role.", role.name))
        }
        Err(PlatformError::Forbidden) => {
            Reply::private("I don't have permission to assign that role.")
        }
        Err(PlatformError::NotFound) => {
            Reply::private("Verification role not found. Contact an admin.")
        }
        Err(err) => failed(err),
    }
}

fn failed(err: PlatformError) -> Reply {
    warn!(%err, "verification failed");
    Reply::private(format!("Failed to verify: {err}"))
}

#[cfg(test)]
mod tests {
    use serenity::all::{Permissions, UserId};

    use super::*;
    use crate::test_util::{FakePlatform, Failure, Op, actor};

    #[tokio::test]
    async fn grants_role_once() {
        let platform = FakePlatform::new();
        let role = platform.add_role(42, "Member");
        let mut member = actor(123, Permissions::empty());

        let reply = verify(&platform, &member, role).await;
        assert_eq!(
            reply,
            Reply::private("✅ You have been given the **Member** role.")
        );
        assert_eq!(platform.recorded().member_roles[&UserId::new(123)].len(), 1);

        // the next interaction reports the role that was just granted
        member.roles.push(role);
        let reply = verify(&platform, &member, role).await;
        assert_eq!(reply, Reply::private("You are already verified."));
        assert_eq!(platform.recorded().member_roles[&UserId::new(123)].len(), 1);
    }

    #[tokio::test]
    async fn missing_role_is_reported_without_side_effects() {
        let platform = FakePlatform::new();
        let reply = verify(&platform, &actor(123, Permissions::empty()), RoleId::new(42)).await;
        assert_eq!(
            reply,
            Reply::private("Verification role not found. Contact an admin.")
        );
        assert_eq!(platform.recorded().mutations(), 0);
    }

    #[tokio::test]
    async fn bot_without_role_permission() {
        let platform = FakePlatform::new();
        let role = platform.add_role(42, "Member");
        platform.fail(Op::AddRole, Failure::Forbidden);

        let reply = verify(&platform, &actor(123, Permissions::empty()), role).await;
        assert_eq!(
            reply,
            Reply::private("I don't have permission to assign that role.")
        );
        assert!(platform.recorded().member_roles.is_empty());
    }

    #[tokio::test]
    async fn unexpected_failures_are_reported() {
        let platform = FakePlatform::new();
        let role = platform.add_role(42, "Member");
        platform.fail(Op::AddRole, Failure::Other);

        let reply = verify(&platform, &actor(123, Permissions::empty()), role).await;
        assert!(reply.ephemeral);
        assert!(reply.content.starts_with("Failed to verify:"));
    }
}
