//! Sync engine configuration.

use serde::{Deserialize, Serialize};

/// How subgroups are discovered during recursive group expansion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubgroupPolicy {
    /// DN-structural nesting: subgroups are groups whose DN sits beneath the
    /// parent's DN (legacy schema).
    #[default]
    Subordinate,
    /// Declared nesting: a group's member list may name other groups by DN.
    Nested,
}

/// Username casing applied to incoming directory names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasePolicy {
    Uppercase,
    Lowercase,
    Preserve,
}

/// Configuration for the reconciliation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Subgroup discovery strategy.
    #[serde(default)]
    pub subgroup_policy: SubgroupPolicy,

    /// Match usernames case-insensitively; incoming names are stored in
    /// canonical lowercase.
    #[serde(default)]
    pub ignore_username_case: bool,

    /// Force incoming usernames to lowercase.
    #[serde(default)]
    pub force_username_lowercase: bool,

    /// Force incoming usernames to uppercase. Wins over the other casing
    /// flags.
    #[serde(default)]
    pub force_username_uppercase: bool,

    /// Whether sync-only passes refresh first/last/email of already-imported
    /// users, or touch membership alone.
    #[serde(default = "default_refresh_attributes")]
    pub refresh_attributes: bool,
}

fn default_refresh_attributes() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            subgroup_policy: SubgroupPolicy::default(),
            ignore_username_case: false,
            force_username_lowercase: false,
            force_username_uppercase: false,
            refresh_attributes: default_refresh_attributes(),
        }
    }
}

impl SyncConfig {
    /// The effective casing policy.
    ///
    /// Precedence: force-uppercase, then force-lowercase, then ignore-case
    /// (which stores canonical lowercase), then leave as-is.
    #[must_use]
    pub fn case_policy(&self) -> CasePolicy {
        if self.force_username_uppercase {
            CasePolicy::Uppercase
        } else if self.force_username_lowercase || self.ignore_username_case {
            CasePolicy::Lowercase
        } else {
            CasePolicy::Preserve
        }
    }
}
