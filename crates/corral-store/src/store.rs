//! The identity store contract.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::model::{LocalGroup, LocalUser, NewUser};

/// CRUD surface the reconciliation engine drives.
///
/// Implementations make each call atomic with respect to concurrent callers:
/// a membership rewrite is observed whole or not at all, and a created user
/// is never visible half-initialized.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up a user by exact username.
    async fn get_user(&self, username: &str) -> StoreResult<Option<LocalUser>>;

    /// Look up a user by username, ignoring case.
    async fn get_user_ignore_case(&self, username: &str) -> StoreResult<Option<LocalUser>>;

    /// Create a user. Fails with `AlreadyExists` on a username collision.
    async fn create_user(&self, user: NewUser) -> StoreResult<LocalUser>;

    /// Replace the attributes of an existing user (keyed by username).
    async fn update_user(&self, user: &LocalUser) -> StoreResult<()>;

    /// All users whose creation method is `External`, in username order.
    async fn external_users(&self) -> StoreResult<Vec<LocalUser>>;

    /// Look up a group by exact name.
    async fn get_group(&self, name: &str) -> StoreResult<Option<LocalGroup>>;

    /// Create a group. Fails with `AlreadyExists` on a name collision.
    async fn create_group(&self, name: &str, directory_managed: bool) -> StoreResult<LocalGroup>;

    /// All directory-managed groups, in name order.
    async fn managed_groups(&self) -> StoreResult<Vec<LocalGroup>>;

    /// Rewrite a group's membership to exactly `members`.
    async fn set_membership(&self, group: &str, members: &BTreeSet<String>) -> StoreResult<()>;

    /// Add one user to a group.
    async fn add_member(&self, group: &str, username: &str) -> StoreResult<()>;

    /// Remove one user from a group.
    async fn remove_member(&self, group: &str, username: &str) -> StoreResult<()>;

    /// All groups the user belongs to, in name order.
    async fn groups_of_user(&self, username: &str) -> StoreResult<Vec<LocalGroup>>;
}
