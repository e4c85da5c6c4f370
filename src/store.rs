use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serenity::all::{ChannelId, GuildId, UserId};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub type TicketId = u64;

/// A tracked ticket. The ids point at platform objects the store does not own,
/// so any of them may have been deleted since.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketRecord {
    #[serde(with = "snowflake")]
    pub guild_id: GuildId,
    #[serde(with = "snowflake")]
    pub channel_id: ChannelId,
    #[serde(with = "snowflake")]
    pub owner_id: UserId,
}

/// Stores ids as plain JSON integers rather than serenity's string form.
mod snowflake {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<T, S>(id: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Copy + Into<u64>,
        S: Serializer,
    {
        serializer.serialize_u64((*id).into())
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: From<u64>,
        D: Deserializer<'de>,
    {
        match u64::deserialize(deserializer)? {
            0 => Err(D::Error::custom("ids must be non-zero")),
            id => Ok(T::from(id)),
        }
    }
}

/// The persisted document: `{"next_id": n, "open": {"<id>": record}}`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TicketState {
    pub next_id: TicketId,
    pub open: BTreeMap<TicketId, TicketRecord>,
}
impl Default for TicketState {
    fn default() -> Self {
        Self {
            next_id: 1,
            open: BTreeMap::new(),
        }
    }
}
impl TicketState {
    fn validate(&self) -> anyhow::Result<()> {
        if self.next_id == 0 {
            anyhow::bail!("next_id must be at least 1");
        }
        if let Some((id, _)) = self.open.iter().find(|(id, _)| **id >= self.next_id) {
            anyhow::bail!(
                "open ticket {id} is not below next_id {}",
                self.next_id
            );
        }
        Ok(())
    }
}

/// File-backed ticket store. Every mutation is persisted before the lock is
/// released, so concurrent handlers never observe or write a half-applied state.
pub struct TicketStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

struct Inner {
    state: TicketState,
    /// Tickets a close is in progress for. Not persisted.
    closing: HashSet<TicketId>,
}

impl TicketStore {
    /// Reads the store at `path`, creating and persisting an empty one if the
    /// file does not exist. Unreadable or inconsistent files are an error.
    pub async fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let state: TicketState = serde_json::from_str(&contents)
                    .with_context(|| format!("failed to parse ticket store {}", path.display()))?;
                state
                    .validate()
                    .with_context(|| format!("ticket store {} is inconsistent", path.display()))?;
                info!(
                    path = %path.display(),
                    next_id = state.next_id,
                    open = state.open.len(),
                    "loaded ticket store"
                );
                Ok(Self::new(path, state))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let store = Self::new(path, TicketState::default());
                store.persist().await?;
                info!(path = %store.path.display(), "created empty ticket store");
                Ok(store)
            }
            Err(err) => {
                Err(err).with_context(|| format!("failed to read ticket store {}", path.display()))
            }
        }
    }

    fn new(path: PathBuf, state: TicketState) -> Self {
        Self {
            path,
            inner: Mutex::new(Inner {
                state,
                closing: HashSet::new(),
            }),
        }
    }

    /// Hands out the current counter value and advances it. The new counter is
    /// persisted before returning, so an id is never issued twice, even if the
    /// ticket it was meant for is never created.
    pub async fn allocate_id(&self) -> anyhow::Result<TicketId> {
        let mut inner = self.inner.lock().await;
        let id = inner.state.next_id;
        inner.state.next_id += 1;
        write_state(&self.path, &inner.state).await?;
        debug!(id, "allocated ticket id");
        Ok(id)
    }

    pub async fn put(&self, id: TicketId, record: TicketRecord) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().await;
        if id >= inner.state.next_id {
            anyhow::bail!("ticket id {id} was never allocated");
        }
        inner.state.open.insert(id, record);
        write_state(&self.path, &inner.state).await
    }

    pub async fn get(&self, id: TicketId) -> Option<TicketRecord> {
        self.inner.lock().await.state.open.get(&id).copied()
    }

    /// Marks an open ticket of `guild_id` as being closed and returns its
    /// record. Returns `None` if the ticket is not open in that guild or
    /// another close already holds it; the claim lasts until [`Self::release`]
    /// or [`Self::remove`].
    pub async fn claim(&self, id: TicketId, guild_id: GuildId) -> Option<TicketRecord> {
        let mut inner = self.inner.lock().await;
        let record = inner
            .state
            .open
            .get(&id)
            .copied()
            .filter(|record| record.guild_id == guild_id)?;
        if !inner.closing.insert(id) {
            debug!(id, "ticket is already being closed");
            return None;
        }
        Some(record)
    }

    /// Drops a claim without touching the record.
    pub async fn release(&self, id: TicketId) {
        self.inner.lock().await.closing.remove(&id);
    }

    /// Stops tracking a ticket, returning its record if it was open.
    pub async fn remove(&self, id: TicketId) -> anyhow::Result<Option<TicketRecord>> {
        let mut inner = self.inner.lock().await;
        inner.closing.remove(&id);
        let removed = inner.state.open.remove(&id);
        if removed.is_some() {
            write_state(&self.path, &inner.state).await?;
        }
        Ok(removed)
    }

    /// Rewrites the store file from memory.
    pub async fn persist(&self) -> anyhow::Result<()> {
        let inner = self.inner.lock().await;
        write_state(&self.path, &inner.state).await
    }

    #[cfg(test)]
    pub async fn snapshot(&self) -> TicketState {
        self.inner.lock().await.state.clone()
    }
}

async fn write_state(path: &Path, state: &TicketState) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let contents = serde_json::to_string_pretty(state)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, contents)
        .await
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}
