//! Per-user memory registry with snapshot persistence.
//!
//! Every user gets their own [`UserMemory`] behind an async mutex. A run
//! takes the owned guard for its whole duration, so two concurrent runs for
//! the same user are serialized while runs for different users proceed in
//! parallel.
//!
//! The whole registry can be written to and read back from a JSON file of
//! the shape `{ "<user>": { "<key>": "<value>" } }`.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use taskweave_core::error::MemoryError;
use taskweave_core::memory::UserMemory;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info};

/// Registry of per-user memories.
#[derive(Default)]
pub struct UserMemoryStore {
    users: RwLock<HashMap<String, Arc<Mutex<UserMemory>>>>,
}

impl UserMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated from an exported snapshot.
    pub fn from_snapshot(snapshot: BTreeMap<String, UserMemory>) -> Self {
        let users = snapshot
            .into_iter()
            .map(|(user, memory)| (user, Arc::new(Mutex::new(memory))))
            .collect();
        Self {
            users: RwLock::new(users),
        }
    }

    /// The slot of a user, created on first use.
    async fn slot(&self, user_id: &str) -> Arc<Mutex<UserMemory>> {
        if let Some(slot) = self.users.read().await.get(user_id) {
            return Arc::clone(slot);
        }
        let mut users = self.users.write().await;
        Arc::clone(
            users
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(UserMemory::new()))),
        )
    }

    /// A copy of the user's memory; empty for users never seen.
    pub async fn get(&self, user_id: &str) -> UserMemory {
        let slot = self.users.read().await.get(user_id).cloned();
        match slot {
            Some(slot) => slot.lock().await.clone(),
            None => UserMemory::new(),
        }
    }

    /// Set one explicit key for a user.
    pub async fn set(&self, user_id: &str, key: impl Into<String>, value: impl Into<String>) {
        let slot = self.slot(user_id).await;
        slot.lock().await.set(key, value);
    }

    /// Exclusive access to a user's memory until the guard is dropped.
    pub async fn lock(&self, user_id: &str) -> OwnedMutexGuard<UserMemory> {
        let slot = self.slot(user_id).await;
        debug!(user_id, "Acquiring user memory lock");
        slot.lock_owned().await
    }

    /// Known user ids, sorted.
    pub async fn users(&self) -> Vec<String> {
        let mut users: Vec<String> = self.users.read().await.keys().cloned().collect();
        users.sort();
        users
    }

    /// Copy of every user's memory.
    pub async fn export(&self) -> BTreeMap<String, UserMemory> {
        let slots: Vec<(String, Arc<Mutex<UserMemory>>)> = self
            .users
            .read()
            .await
            .iter()
            .map(|(user, slot)| (user.clone(), Arc::clone(slot)))
            .collect();

        let mut snapshot = BTreeMap::new();
        for (user, slot) in slots {
            snapshot.insert(user, slot.lock().await.clone());
        }
        snapshot
    }

    /// Replace the memory of every user named in `snapshot`.
    pub async fn import(&self, snapshot: BTreeMap<String, UserMemory>) {
        for (user, memory) in snapshot {
            let slot = self.slot(&user).await;
            *slot.lock().await = memory;
        }
    }

    /// Load a store from a JSON snapshot file. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, MemoryError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No memory snapshot yet, starting empty");
                return Ok(Self::new());
            }
            Err(e) => {
                return Err(MemoryError::Snapshot(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        let snapshot: BTreeMap<String, UserMemory> = serde_json::from_str(&content)
            .map_err(|e| MemoryError::Snapshot(format!("Corrupt snapshot {}: {e}", path.display())))?;

        info!(path = %path.display(), users = snapshot.len(), "Loaded memory snapshot");
        Ok(Self::from_snapshot(snapshot))
    }

    /// Write every user's memory to a JSON snapshot file.
    pub async fn save(&self, path: &Path) -> Result<(), MemoryError> {
        let snapshot = self.export().await;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MemoryError::Snapshot(format!("Failed to create snapshot directory: {e}"))
            })?;
        }

        let content = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| MemoryError::Snapshot(format!("Failed to serialize snapshot: {e}")))?;

        std::fs::write(path, content).map_err(|e| {
            MemoryError::Snapshot(format!("Failed to write {}: {e}", path.display()))
        })?;

        debug!(path = %path.display(), users = snapshot.len(), "Saved memory snapshot");
        Ok(())
    }
}
