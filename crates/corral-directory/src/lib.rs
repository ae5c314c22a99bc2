//! # Directory Client
//!
//! LDAP directory access for corral user/group synchronization.
//!
//! This crate answers one question for the sync engine: "which users and
//! groups does the directory know under this name pattern?" It exposes the
//! [`DirectoryClient`] trait and an `ldap3`-backed implementation with a
//! cached, explicitly-invalidatable connection.
//!
//! ## Example
//!
//! ```ignore
//! use corral_directory::{DirectoryClient, LdapConfig, LdapDirectoryClient, SearchScope};
//!
//! let config = LdapConfig::new(
//!     "ldap.example.com",
//!     "dc=example,dc=com",
//!     "cn=admin,dc=example,dc=com",
//! )
//! .with_password("secret");
//!
//! let client = LdapDirectoryClient::new(config)?;
//! let users = client.find_users("j*", false, SearchScope::Subtree).await?;
//! ```

pub mod attrs;
pub mod client;
pub mod config;
pub mod error;
pub mod ldap;
pub mod pattern;
pub mod records;

// Re-exports
pub use client::{DirectoryClient, SearchScope};
pub use config::{LdapConfig, LdapServers};
pub use error::{DirectoryError, DirectoryResult};
pub use ldap::LdapDirectoryClient;
pub use records::{DirectoryGroup, DirectoryUser};
