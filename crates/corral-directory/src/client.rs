//! The directory client contract.

use async_trait::async_trait;

use crate::error::DirectoryResult;
use crate::records::{DirectoryGroup, DirectoryUser};

/// LDAP search scope for by-DN lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Only the entry named by the DN.
    Base,
    /// The entry and everything beneath it. For group lookups this also
    /// returns every group whose DN is hierarchically under the target.
    Subtree,
}

/// Read-only user/group queries against a directory.
///
/// `pattern` is a literal distinguished name when `by_dn` is set, otherwise
/// a name glob (`*` wildcard, anchored, case-insensitive). Implementations
/// surface transport failures as [`DirectoryError::Unavailable`] and never
/// retry internally.
///
/// [`DirectoryError::Unavailable`]: crate::error::DirectoryError::Unavailable
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Find users matching `pattern`.
    async fn find_users(
        &self,
        pattern: &str,
        by_dn: bool,
        scope: SearchScope,
    ) -> DirectoryResult<Vec<DirectoryUser>>;

    /// Find groups matching `pattern`.
    ///
    /// With `by_dn` and [`SearchScope::Subtree`], descendants of the target
    /// group are included in the answer.
    async fn find_groups(
        &self,
        pattern: &str,
        by_dn: bool,
        scope: SearchScope,
    ) -> DirectoryResult<Vec<DirectoryGroup>>;
}
