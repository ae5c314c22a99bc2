//! Directory record types.
//!
//! Immutable snapshots of directory entries as returned by one search.
//! All fields are explicit; optional attributes are `Option`, never
//! dynamically present or absent.

use serde::{Deserialize, Serialize};

/// A user entry as the directory answered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    /// Distinguished name, unique within the directory.
    pub dn: String,

    /// Username with any `@domain` suffix stripped; this is the value the
    /// local store will persist.
    pub username: String,

    /// The unstripped username attribute value, kept for subsequent
    /// directory lookups when it differed from `username`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory_username: Option<String>,

    /// First name, truncated by the client boundary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    /// Last name, truncated by the client boundary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// DNs of the groups this entry claims membership in, in directory order.
    #[serde(default)]
    pub group_dns: Vec<String>,
}

impl DirectoryUser {
    /// Minimal record for a username and DN.
    pub fn new(dn: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            username: username.into(),
            directory_username: None,
            first_name: None,
            last_name: None,
            email: None,
            group_dns: Vec::new(),
        }
    }
}

/// A group entry as the directory answered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryGroup {
    /// Distinguished name, unique within the directory.
    pub dn: String,

    /// Group name.
    pub name: String,

    /// Member DNs in directory order; may reference users or other groups.
    #[serde(default)]
    pub member_dns: Vec<String>,

    /// Members listed by bare username (legacy posix schema).
    #[serde(default)]
    pub posix_members: Vec<String>,
}

impl DirectoryGroup {
    /// Minimal record for a group name and DN.
    pub fn new(dn: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            name: name.into(),
            member_dns: Vec::new(),
            posix_members: Vec::new(),
        }
    }
}
