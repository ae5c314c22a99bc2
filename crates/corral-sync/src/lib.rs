//! # Directory Reconciliation Engine
//!
//! Imports and periodically re-synchronizes users and groups from an
//! external directory into the local identity store.
//!
//! The engine drives three collaborators: a
//! [`DirectoryClient`](corral_directory::DirectoryClient) answering
//! name-pattern queries, the [`normalize`] policy layer cleaning incoming
//! names, and the [`expand`] engine resolving nested or subordinate group
//! membership. Reconciliation is idempotent: running a sync twice against an
//! unchanged directory mutates nothing on the second pass.
//!
//! ## Ownership rules
//!
//! - A local group is directory-managed only if sync created it; a naming
//!   collision with an operator-created group never converts it.
//! - Sync never deletes local users and never touches membership of
//!   non-managed groups.
//! - An existing local user's attributes and creation method survive a
//!   colliding directory import untouched.
//!
//! ## Example
//!
//! ```ignore
//! use corral_sync::{ImportGroupOptions, SyncConfig, SyncEngine};
//!
//! let engine = SyncEngine::new(directory, store, SyncConfig::default());
//! let report = engine
//!     .import_groups("TestUsers", &ImportGroupOptions {
//!         import_members: true,
//!         sync_users: true,
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("created {} users", report.users_created);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod expand;
pub mod normalize;
pub mod report;

// Re-exports
pub use config::{CasePolicy, SubgroupPolicy, SyncConfig};
pub use engine::{ImportGroupOptions, ImportUserOptions, SyncEngine};
pub use error::{SyncError, SyncResult};
pub use expand::{GroupExpander, ResolvedGroup};
pub use report::{ImportFailure, SyncReport};
