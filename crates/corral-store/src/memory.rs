//! Reference in-memory identity store.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::model::{CreationMethod, LocalGroup, LocalUser, NewUser};
use crate::store::IdentityStore;

#[derive(Debug, Default)]
struct GroupState {
    directory_managed: bool,
    members: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct Inner {
    users: BTreeMap<String, LocalUser>,
    groups: BTreeMap<String, GroupState>,
    revision: u64,
}

impl Inner {
    fn group(&self, name: &str) -> Option<LocalGroup> {
        self.groups.get(name).map(|state| LocalGroup {
            name: name.to_string(),
            directory_managed: state.directory_managed,
            members: state.members.clone(),
        })
    }
}

/// In-memory [`IdentityStore`] behind a single lock.
///
/// Every trait call takes the lock once, so each call is atomic toward other
/// callers. A revision counter advances only when state actually changes,
/// which lets tests assert that a repeated sync was a true no-op.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic count of state-changing operations applied so far.
    pub async fn revision(&self) -> u64 {
        self.inner.read().await.revision
    }

    /// All users, in username order.
    pub async fn users(&self) -> Vec<LocalUser> {
        self.inner.read().await.users.values().cloned().collect()
    }

    /// All groups, in name order.
    pub async fn groups(&self) -> Vec<LocalGroup> {
        let inner = self.inner.read().await;
        inner
            .groups
            .keys()
            .filter_map(|name| inner.group(name))
            .collect()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn get_user(&self, username: &str) -> StoreResult<Option<LocalUser>> {
        Ok(self.inner.read().await.users.get(username).cloned())
    }

    async fn get_user_ignore_case(&self, username: &str) -> StoreResult<Option<LocalUser>> {
        let folded = username.to_lowercase();
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.username.to_lowercase() == folded)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<LocalUser> {
        let mut inner = self.inner.write().await;
        if inner.users.contains_key(&user.username) {
            return Err(StoreError::user_exists(user.username));
        }
        let created = LocalUser {
            username: user.username.clone(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            creation_method: user.creation_method,
        };
        inner.users.insert(user.username, created.clone());
        inner.revision += 1;
        Ok(created)
    }

    async fn update_user(&self, user: &LocalUser) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        match inner.users.get_mut(&user.username) {
            Some(existing) => {
                if existing != user {
                    *existing = user.clone();
                    inner.revision += 1;
                }
                Ok(())
            }
            None => Err(StoreError::user_not_found(&user.username)),
        }
    }

    async fn external_users(&self) -> StoreResult<Vec<LocalUser>> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .filter(|u| u.creation_method == CreationMethod::External)
            .cloned()
            .collect())
    }

    async fn get_group(&self, name: &str) -> StoreResult<Option<LocalGroup>> {
        Ok(self.inner.read().await.group(name))
    }

    async fn create_group(&self, name: &str, directory_managed: bool) -> StoreResult<LocalGroup> {
        let mut inner = self.inner.write().await;
        if inner.groups.contains_key(name) {
            return Err(StoreError::group_exists(name));
        }
        inner.groups.insert(
            name.to_string(),
            GroupState {
                directory_managed,
                members: BTreeSet::new(),
            },
        );
        inner.revision += 1;
        Ok(LocalGroup {
            name: name.to_string(),
            directory_managed,
            members: BTreeSet::new(),
        })
    }

    async fn managed_groups(&self) -> StoreResult<Vec<LocalGroup>> {
        let inner = self.inner.read().await;
        Ok(inner
            .groups
            .iter()
            .filter(|(_, state)| state.directory_managed)
            .filter_map(|(name, _)| inner.group(name))
            .collect())
    }

    async fn set_membership(&self, group: &str, members: &BTreeSet<String>) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        for member in members {
            if !inner.users.contains_key(member) {
                return Err(StoreError::user_not_found(member));
            }
        }
        let state = inner
            .groups
            .get_mut(group)
            .ok_or_else(|| StoreError::group_not_found(group))?;
        if &state.members != members {
            state.members = members.clone();
            inner.revision += 1;
        }
        Ok(())
    }

    async fn add_member(&self, group: &str, username: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(username) {
            return Err(StoreError::user_not_found(username));
        }
        let state = inner
            .groups
            .get_mut(group)
            .ok_or_else(|| StoreError::group_not_found(group))?;
        if state.members.insert(username.to_string()) {
            inner.revision += 1;
        }
        Ok(())
    }

    async fn remove_member(&self, group: &str, username: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let state = inner
            .groups
            .get_mut(group)
            .ok_or_else(|| StoreError::group_not_found(group))?;
        if state.members.remove(username) {
            inner.revision += 1;
        }
        Ok(())
    }

    async fn groups_of_user(&self, username: &str) -> StoreResult<Vec<LocalGroup>> {
        let inner = self.inner.read().await;
        Ok(inner
            .groups
            .iter()
            .filter(|(_, state)| state.members.contains(username))
            .filter_map(|(name, _)| inner.group(name))
            .collect())
    }
}
