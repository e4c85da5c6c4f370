use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Configuration {
    pub authentication: Authentication,
    pub discord: Discord,
    pub roles: Roles,
    pub tickets: Tickets,
}
impl Configuration {
    const FILENAME: &str = "config.toml";

    pub fn load() -> anyhow::Result<Self> {
        let config = if let Ok(file) = std::fs::read_to_string(Self::FILENAME) {
            Self::parse(&file)?
        } else {
            Self::default()
        };
        config.save()?;

        Ok(config)
    }

    fn parse(contents: &str) -> anyhow::Result<Self> {
        toml::from_str(contents).context("failed to load config")
    }

    fn save(&self) -> anyhow::Result<()> {
        Ok(std::fs::write(
            Self::FILENAME,
            toml::to_string_pretty(self)?,
        )?)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Authentication {
    pub discord_token: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Discord {
    /// Registers commands on this guild only, which applies immediately
    /// instead of waiting on global propagation
    pub guild_id: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Roles {
    /// Holders of this role can see and close every ticket
    pub support_role_name: String,
    /// Granted by the verification panel
    pub verify_role_name: String,
}
impl Default for Roles {
    fn default() -> Self {
        Self {
            support_role_name: "Support".to_string(),
            verify_role_name: "Member".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Tickets {
    /// Directory holding `tickets.json`
    pub folder: PathBuf,
    /// Whose access to the channel is revoked when a ticket is closed
    pub revoke_on_close: RevokeTarget,
}
impl Default for Tickets {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("tickets"),
            revoke_on_close: RevokeTarget::Closer,
        }
    }
}
impl Tickets {
    pub fn store_path(&self) -> PathBuf {
        self.folder.join("tickets.json")
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RevokeTarget {
    /// The member who pressed close (or ran the command)
    #[default]
    Closer,
    /// The member who opened the ticket
    Owner,
}
