//! Reconciliation run reporting.

use serde::{Deserialize, Serialize};

/// A per-entity failure recorded while the batch continued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFailure {
    /// Normalized name of the entity that failed.
    pub name: String,
    /// Human-readable reason.
    pub reason: String,
}

/// Outcome of one import or sync request.
///
/// Validation failures and naming collisions degrade to entries here; only a
/// directory communication failure aborts a request outright.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    /// Directory users matched by the request pattern.
    pub matched_users: usize,
    /// Directory groups matched by the request pattern.
    pub matched_groups: usize,
    /// Local users created.
    pub users_created: usize,
    /// Local users whose attributes were refreshed.
    pub users_updated: usize,
    /// Local groups created (and marked directory-managed).
    pub groups_created: usize,
    /// Groups whose membership was rewritten.
    pub groups_synced: usize,
    /// Individual membership attachments.
    pub memberships_added: usize,
    /// Individual membership detachments.
    pub memberships_removed: usize,
    /// Users that failed validation and were skipped.
    pub failed_users: Vec<ImportFailure>,
    /// Directory groups whose name collided with a locally-owned group.
    pub naming_collisions: Vec<String>,
}

impl SyncReport {
    /// Record a skipped user.
    pub fn fail_user(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        self.failed_users.push(ImportFailure {
            name: name.into(),
            reason: reason.into(),
        });
    }

    /// Whether any entity was skipped.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed_users.is_empty() || !self.naming_collisions.is_empty()
    }

    /// Comma-separated names of the skipped users, for operator-facing
    /// messages ("Failed to import following users: ...").
    #[must_use]
    pub fn failed_usernames(&self) -> String {
        self.failed_users
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: SyncReport) {
        self.matched_users += other.matched_users;
        self.matched_groups += other.matched_groups;
        self.users_created += other.users_created;
        self.users_updated += other.users_updated;
        self.groups_created += other.groups_created;
        self.groups_synced += other.groups_synced;
        self.memberships_added += other.memberships_added;
        self.memberships_removed += other.memberships_removed;
        self.failed_users.extend(other.failed_users);
        self.naming_collisions.extend(other.naming_collisions);
    }
}
