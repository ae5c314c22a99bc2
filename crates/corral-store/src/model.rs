//! Identity store data model.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// How a local user entered the store.
///
/// Recorded at creation and never rewritten by sync; it is what keeps a
/// locally-created account from silently becoming directory-owned when a
/// directory user arrives under the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationMethod {
    /// Created by directory synchronization.
    External,
    /// Created by an operator in the console.
    Local,
}

/// A user persisted in the local identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalUser {
    /// Unique username. Case-sensitive by default; case-insensitive matching
    /// is a lookup policy, not a storage property.
    pub username: String,

    /// First name, at most 30 characters.
    #[serde(default)]
    pub first_name: String,

    /// Last name, at most 30 characters.
    #[serde(default)]
    pub last_name: String,

    /// Email address.
    #[serde(default)]
    pub email: String,

    /// How this user was created.
    pub creation_method: CreationMethod,
}

/// Attributes for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub creation_method: CreationMethod,
}

impl NewUser {
    /// A user entering via directory sync.
    pub fn external(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            creation_method: CreationMethod::External,
        }
    }

    /// A user created locally by an operator.
    pub fn local(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            creation_method: CreationMethod::Local,
        }
    }

    pub fn with_names(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = first.into();
        self.last_name = last.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }
}

/// A group persisted in the local identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalGroup {
    /// Unique group name.
    pub name: String,

    /// Set the first time the group is created by sync; never set
    /// retroactively on a group that pre-existed under the same name.
    pub directory_managed: bool,

    /// Usernames of the group's members.
    #[serde(default)]
    pub members: BTreeSet<String>,
}

impl LocalGroup {
    /// Whether `username` is a member.
    pub fn has_member(&self, username: &str) -> bool {
        self.members.contains(username)
    }
}
