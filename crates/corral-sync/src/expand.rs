//! Group membership expansion.
//!
//! Resolves a directory group into the set of member identities to
//! materialize locally, under one of two subgroup strategies:
//!
//! - [`SubgroupPolicy::Subordinate`]: subgroups are groups whose DN sits
//!   hierarchically beneath the target's DN. Recursive expansion unions the
//!   descendants' members into the target.
//! - [`SubgroupPolicy::Nested`]: a member DN may itself name a group.
//!   Subgroups stay separate groups — discovered as shells when recursion is
//!   off, expanded with their own members when on — and never flatten into
//!   the parent.
//!
//! Both strategies thread a visited-DN set through the traversal, so a group
//! graph containing a cycle terminates with each DN expanded at most once.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use corral_directory::{DirectoryClient, DirectoryGroup, DirectoryResult, SearchScope};

use crate::config::SubgroupPolicy;

/// One directory group with its membership resolved for materialization.
#[derive(Debug, Clone)]
pub struct ResolvedGroup {
    /// The directory record.
    pub group: DirectoryGroup,
    /// Member DNs expected to resolve to users, deduplicated, directory
    /// order preserved.
    pub member_dns: Vec<String>,
    /// Members referenced by bare username (legacy posix schema).
    pub posix_members: Vec<String>,
    /// False for a nested subgroup discovered but not expanded: the group
    /// shell is materialized and its membership left alone.
    pub expanded: bool,
}

/// Expands group membership against a directory under a subgroup policy.
pub struct GroupExpander<'a, D> {
    directory: &'a D,
    policy: SubgroupPolicy,
}

impl<'a, D: DirectoryClient> GroupExpander<'a, D> {
    pub fn new(directory: &'a D, policy: SubgroupPolicy) -> Self {
        Self { directory, policy }
    }

    /// Resolve `group` and, when `recursive`, its subgroups.
    ///
    /// The target group is always the first entry of the answer.
    pub async fn resolve(
        &self,
        group: &DirectoryGroup,
        recursive: bool,
    ) -> DirectoryResult<Vec<ResolvedGroup>> {
        match self.policy {
            SubgroupPolicy::Subordinate => self.resolve_subordinate(group, recursive).await,
            SubgroupPolicy::Nested => self.resolve_nested(group, recursive).await,
        }
    }

    async fn resolve_subordinate(
        &self,
        group: &DirectoryGroup,
        recursive: bool,
    ) -> DirectoryResult<Vec<ResolvedGroup>> {
        let mut target = ResolvedGroup {
            group: group.clone(),
            member_dns: group.member_dns.clone(),
            posix_members: group.posix_members.clone(),
            expanded: true,
        };

        if recursive {
            let mut visited: HashSet<String> = HashSet::new();
            visited.insert(group.dn.to_lowercase());

            // Subtree lookup by DN answers the target plus every descendant.
            let descendants = self
                .directory
                .find_groups(&group.dn, true, SearchScope::Subtree)
                .await?;
            for sub in descendants {
                if !visited.insert(sub.dn.to_lowercase()) {
                    continue;
                }
                debug!(parent = %group.dn, subgroup = %sub.dn, "Folding subordinate group members");
                target.member_dns.extend(sub.member_dns);
                target.posix_members.extend(sub.posix_members);
            }
        }

        dedup_preserving_order(&mut target.member_dns);
        dedup_preserving_order(&mut target.posix_members);
        Ok(vec![target])
    }

    async fn resolve_nested(
        &self,
        group: &DirectoryGroup,
        recursive: bool,
    ) -> DirectoryResult<Vec<ResolvedGroup>> {
        let mut out: Vec<ResolvedGroup> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(group.dn.to_lowercase());

        let mut queue: VecDeque<DirectoryGroup> = VecDeque::new();
        queue.push_back(group.clone());

        let mut cycles_skipped = 0usize;

        while let Some(current) = queue.pop_front() {
            let mut resolved = ResolvedGroup {
                group: current.clone(),
                member_dns: Vec::new(),
                posix_members: current.posix_members.clone(),
                expanded: true,
            };
            let mut shells: Vec<ResolvedGroup> = Vec::new();

            for member_dn in &current.member_dns {
                // A base-scope group lookup decides whether this member is a
                // subgroup or a user entry.
                let matches = self
                    .directory
                    .find_groups(member_dn, true, SearchScope::Base)
                    .await?;
                if matches.is_empty() {
                    resolved.member_dns.push(member_dn.clone());
                    continue;
                }
                for sub in matches {
                    if !visited.insert(sub.dn.to_lowercase()) {
                        cycles_skipped += 1;
                        continue;
                    }
                    if recursive {
                        queue.push_back(sub);
                    } else {
                        shells.push(ResolvedGroup {
                            group: sub,
                            member_dns: Vec::new(),
                            posix_members: Vec::new(),
                            expanded: false,
                        });
                    }
                }
            }

            dedup_preserving_order(&mut resolved.member_dns);
            out.push(resolved);
            out.append(&mut shells);
        }

        if cycles_skipped > 0 {
            warn!(
                group = %group.dn,
                skipped = cycles_skipped,
                "Skipped already-visited groups during nested expansion"
            );
        }
        Ok(out)
    }
}

fn dedup_preserving_order(values: &mut Vec<String>) {
    let mut seen: HashSet<String> = HashSet::new();
    values.retain(|value| seen.insert(value.to_lowercase()));
}
