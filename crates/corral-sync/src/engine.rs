//! The reconciliation engine.
//!
//! Orchestrates directory queries, name normalization, and group expansion
//! into idempotent upserts against the local identity store. Each request is
//! one sequential pass: resolve against the directory, expand groups if the
//! request asks for it, diff against the store, apply.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use corral_directory::{DirectoryClient, DirectoryGroup, DirectoryUser, SearchScope};
use corral_store::{CreationMethod, IdentityStore, LocalGroup, LocalUser, NewUser};

use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::expand::{GroupExpander, ResolvedGroup};
use crate::normalize;
use crate::report::SyncReport;

/// Options for a user import request.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportUserOptions {
    /// Also reconcile the imported users' memberships in directory-managed
    /// groups from their claimed group DNs.
    pub sync_groups: bool,
    /// Treat the pattern as a literal distinguished name.
    pub by_dn: bool,
}

/// Options for a group import request.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportGroupOptions {
    /// Resolve members and create missing local users.
    pub import_members: bool,
    /// Descend into subgroups per the configured subgroup policy. Only
    /// meaningful together with `import_members`.
    pub recursive: bool,
    /// Without `import_members`: still recompute membership, restricted to
    /// users that already exist locally.
    pub sync_users: bool,
    /// Treat the pattern as a literal distinguished name.
    pub by_dn: bool,
}

/// Drives directory state into the local identity store.
///
/// Not internally concurrent: a request runs to completion or fails; a
/// caller-level timeout is the only cancellation mechanism.
pub struct SyncEngine<D, S> {
    directory: Arc<D>,
    store: Arc<S>,
    config: SyncConfig,
}

impl<D, S> SyncEngine<D, S>
where
    D: DirectoryClient,
    S: IdentityStore,
{
    pub fn new(directory: Arc<D>, store: Arc<S>, config: SyncConfig) -> Self {
        Self {
            directory,
            store,
            config,
        }
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Import users matching `pattern` from the directory.
    ///
    /// An existing local user under an incoming name keeps its attributes
    /// and creation method; it is only attached to groups when
    /// `sync_groups` is requested.
    #[instrument(skip(self, opts), fields(sync_groups = opts.sync_groups, by_dn = opts.by_dn))]
    pub async fn import_users(
        &self,
        pattern: &str,
        opts: &ImportUserOptions,
    ) -> SyncResult<SyncReport> {
        let mut report = SyncReport::default();
        let records = self
            .directory
            .find_users(pattern, opts.by_dn, SearchScope::Subtree)
            .await?;
        if records.is_empty() {
            warn!(pattern, "No directory users matched pattern");
        }
        report.matched_users = records.len();

        self.upsert_users(&records, opts.sync_groups, &mut report)
            .await?;
        info!(
            pattern,
            created = report.users_created,
            failed = report.failed_users.len(),
            "User import finished"
        );
        Ok(report)
    }

    /// Import groups matching `pattern` from the directory.
    #[instrument(
        skip(self, opts),
        fields(
            import_members = opts.import_members,
            recursive = opts.recursive,
            sync_users = opts.sync_users,
            by_dn = opts.by_dn,
        )
    )]
    pub async fn import_groups(
        &self,
        pattern: &str,
        opts: &ImportGroupOptions,
    ) -> SyncResult<SyncReport> {
        let mut report = SyncReport::default();
        let groups = self
            .directory
            .find_groups(pattern, opts.by_dn, SearchScope::Subtree)
            .await?;
        if groups.is_empty() {
            warn!(pattern, "No directory groups matched pattern");
        }
        report.matched_groups = groups.len();

        for group in &groups {
            self.import_one_group(group, opts, &mut report).await?;
        }
        info!(
            pattern,
            groups_created = report.groups_created,
            users_created = report.users_created,
            failed = report.failed_users.len(),
            "Group import finished"
        );
        Ok(report)
    }

    /// Refresh every directory-created local user from current directory
    /// state. Never creates or deletes users; a user the directory no longer
    /// answers for is left alone.
    #[instrument(skip(self))]
    pub async fn sync_users(&self) -> SyncResult<SyncReport> {
        let mut report = SyncReport::default();
        for user in self.store.external_users().await? {
            let records = self
                .directory
                .find_users(&user.username, false, SearchScope::Subtree)
                .await?;
            let Some(record) = records.first() else {
                warn!(username = %user.username, "Could not get directory details for user");
                continue;
            };
            if !self.config.refresh_attributes {
                continue;
            }
            let mut updated = user.clone();
            updated.first_name = record
                .first_name
                .as_deref()
                .map(|v| normalize::truncate_chars(v, normalize::NAME_MAX_CHARS))
                .unwrap_or_default();
            updated.last_name = record
                .last_name
                .as_deref()
                .map(|v| normalize::truncate_chars(v, normalize::NAME_MAX_CHARS))
                .unwrap_or_default();
            updated.email = record.email.clone().unwrap_or_default();
            if updated != user {
                self.store.update_user(&updated).await?;
                report.users_updated += 1;
            }
        }
        info!(updated = report.users_updated, "User sync finished");
        Ok(report)
    }

    /// Recompute membership of every directory-managed group from current
    /// directory state, restricted to users already known locally. Never
    /// creates groups or users.
    #[instrument(skip(self))]
    pub async fn sync_groups(&self) -> SyncResult<SyncReport> {
        let mut report = SyncReport::default();
        for group in self.store.managed_groups().await? {
            let matches = self
                .directory
                .find_groups(&group.name, false, SearchScope::Subtree)
                .await?;
            let Some(dir_group) = matches.into_iter().find(|g| g.name == group.name) else {
                warn!(group = %group.name, "Could not get directory details for group");
                continue;
            };
            self.sync_known_members(&dir_group, &group, &mut report)
                .await?;
        }
        info!(synced = report.groups_synced, "Group sync finished");
        Ok(report)
    }

    /// Sync users, then groups, in one pass.
    pub async fn sync_all(&self) -> SyncResult<SyncReport> {
        let mut report = self.sync_users().await?;
        report.merge(self.sync_groups().await?);
        Ok(report)
    }

    /// Recompute one user's memberships in directory-managed groups from the
    /// group DNs the directory currently claims for them. Memberships in
    /// non-managed groups are never touched.
    #[instrument(skip(self))]
    pub async fn sync_user_groups(&self, username: &str) -> SyncResult<SyncReport> {
        let mut report = SyncReport::default();
        let Some(user) = self.store.get_user(username).await? else {
            warn!(username, "User not present locally; nothing to sync");
            return Ok(report);
        };
        let records = self
            .directory
            .find_users(&user.username, false, SearchScope::Subtree)
            .await?;
        let Some(record) = records.first() else {
            warn!(username, "Could not get directory details for user");
            return Ok(report);
        };
        self.sync_claimed_groups(record, &user, &mut report).await?;
        Ok(report)
    }

    /// Upsert a batch of directory user records; returns the local users
    /// that exist after the pass, in record order, excluding failures.
    async fn upsert_users(
        &self,
        records: &[DirectoryUser],
        sync_groups: bool,
        report: &mut SyncReport,
    ) -> SyncResult<Vec<LocalUser>> {
        let mut present = Vec::new();
        for record in records {
            if let Some(user) = self.upsert_user(record, sync_groups, report).await? {
                present.push(user);
            }
        }
        Ok(present)
    }

    async fn upsert_user(
        &self,
        record: &DirectoryUser,
        sync_groups: bool,
        report: &mut SyncReport,
    ) -> SyncResult<Option<LocalUser>> {
        let username = normalize::apply_case(&record.username, self.config.case_policy());
        if let Err(reason) = normalize::validate_username(&username) {
            warn!(username = %record.username, %reason, "Skipping directory user");
            report.fail_user(&username, reason.to_string());
            return Ok(None);
        }
        if let Err(reason) = normalize::validate_person_names(
            record.first_name.as_deref(),
            record.last_name.as_deref(),
        ) {
            warn!(username = %record.username, %reason, "Skipping directory user");
            report.fail_user(&username, reason.to_string());
            return Ok(None);
        }

        let existing = if self.config.ignore_username_case {
            self.store.get_user_ignore_case(&username).await?
        } else {
            self.store.get_user(&username).await?
        };

        let user = match existing {
            // Collision preservation: the local user keeps attributes and
            // creation method, whatever the directory says.
            Some(user) => {
                debug!(username = %user.username, "User already exists locally; not overwriting");
                user
            }
            None => {
                let created = self
                    .store
                    .create_user(NewUser {
                        username: username.clone(),
                        first_name: record.first_name.clone().unwrap_or_default(),
                        last_name: record.last_name.clone().unwrap_or_default(),
                        email: record.email.clone().unwrap_or_default(),
                        creation_method: CreationMethod::External,
                    })
                    .await?;
                report.users_created += 1;
                created
            }
        };

        if sync_groups {
            self.sync_claimed_groups(record, &user, report).await?;
        }
        Ok(Some(user))
    }

    /// Reconcile a user's managed-group memberships against the group DNs
    /// their directory record claims.
    async fn sync_claimed_groups(
        &self,
        record: &DirectoryUser,
        user: &LocalUser,
        report: &mut SyncReport,
    ) -> SyncResult<()> {
        let mut claimed: BTreeSet<String> = BTreeSet::new();
        for group_dn in &record.group_dns {
            let matches = self
                .directory
                .find_groups(group_dn, true, SearchScope::Base)
                .await?;
            for dir_group in matches {
                match self.store.get_group(&dir_group.name).await? {
                    Some(group) if group.directory_managed => {
                        if !group.has_member(&user.username) {
                            self.store.add_member(&group.name, &user.username).await?;
                            report.memberships_added += 1;
                        }
                        claimed.insert(group.name);
                    }
                    Some(_) => {
                        debug!(group = %dir_group.name, "Claimed group is locally owned; skipping");
                    }
                    None => {
                        debug!(group = %dir_group.name, "Claimed group not imported; skipping");
                    }
                }
            }
        }

        // Detach from managed groups the directory no longer claims.
        for group in self.store.groups_of_user(&user.username).await? {
            if group.directory_managed && !claimed.contains(&group.name) {
                self.store.remove_member(&group.name, &user.username).await?;
                report.memberships_removed += 1;
            }
        }
        Ok(())
    }

    async fn import_one_group(
        &self,
        dir_group: &DirectoryGroup,
        opts: &ImportGroupOptions,
        report: &mut SyncReport,
    ) -> SyncResult<()> {
        if opts.import_members {
            let expander =
                GroupExpander::new(self.directory.as_ref(), self.config.subgroup_policy);
            let resolved = expander.resolve(dir_group, opts.recursive).await?;
            for entry in &resolved {
                self.materialize_group(entry, report).await?;
            }
        } else {
            let Some(local) = self.ensure_group(dir_group, report).await? else {
                return Ok(());
            };
            if opts.sync_users {
                self.sync_known_members(dir_group, &local, report).await?;
            }
            // Shell-only import: membership untouched.
        }
        Ok(())
    }

    /// Load the local group for a directory group, creating it
    /// directory-managed when absent. A pre-existing locally-owned group of
    /// the same name is a naming collision: it stays unmanaged, its
    /// membership stays intact, and `None` is returned.
    async fn ensure_group(
        &self,
        dir_group: &DirectoryGroup,
        report: &mut SyncReport,
    ) -> SyncResult<Option<LocalGroup>> {
        match self.store.get_group(&dir_group.name).await? {
            Some(group) if group.directory_managed => Ok(Some(group)),
            Some(_) => {
                warn!(
                    group = %dir_group.name,
                    "Naming collision with locally-owned group; leaving it untouched"
                );
                report.naming_collisions.push(dir_group.name.clone());
                Ok(None)
            }
            None => {
                let group = self.store.create_group(&dir_group.name, true).await?;
                report.groups_created += 1;
                Ok(Some(group))
            }
        }
    }

    /// Materialize one resolved group: create it if needed, import its
    /// members, and rewrite membership to exactly the resolved set.
    async fn materialize_group(
        &self,
        entry: &ResolvedGroup,
        report: &mut SyncReport,
    ) -> SyncResult<()> {
        let Some(local) = self.ensure_group(&entry.group, report).await? else {
            return Ok(());
        };
        if !entry.expanded {
            // Subgroup discovered but not expanded: shell only.
            return Ok(());
        }

        let mut members: BTreeSet<String> = BTreeSet::new();
        for member_dn in &entry.member_dns {
            let records = self
                .directory
                .find_users(member_dn, true, SearchScope::Base)
                .await?;
            // A member DN that is not a user entry resolves to nothing and
            // contributes no members.
            let users = self.upsert_users(&records, false, report).await?;
            members.extend(users.into_iter().map(|u| u.username));
        }
        for posix_member in &entry.posix_members {
            let records = self
                .directory
                .find_users(posix_member, false, SearchScope::Subtree)
                .await?;
            let users = self.upsert_users(&records, false, report).await?;
            members.extend(users.into_iter().map(|u| u.username));
        }

        self.store.set_membership(&local.name, &members).await?;
        report.groups_synced += 1;
        debug!(group = %local.name, members = members.len(), "Group membership rewritten");
        Ok(())
    }

    /// Rewrite a managed group's membership to the resolved members that
    /// already exist locally; nothing is created.
    async fn sync_known_members(
        &self,
        dir_group: &DirectoryGroup,
        local: &LocalGroup,
        report: &mut SyncReport,
    ) -> SyncResult<()> {
        let mut members: BTreeSet<String> = BTreeSet::new();
        for member_dn in &dir_group.member_dns {
            let records = self
                .directory
                .find_users(member_dn, true, SearchScope::Base)
                .await?;
            self.collect_known(&records, &mut members).await?;
        }
        for posix_member in &dir_group.posix_members {
            let records = self
                .directory
                .find_users(posix_member, false, SearchScope::Subtree)
                .await?;
            self.collect_known(&records, &mut members).await?;
        }

        self.store.set_membership(&local.name, &members).await?;
        report.groups_synced += 1;
        Ok(())
    }

    async fn collect_known(
        &self,
        records: &[DirectoryUser],
        members: &mut BTreeSet<String>,
    ) -> SyncResult<()> {
        for record in records {
            let username = normalize::apply_case(&record.username, self.config.case_policy());
            match self.store.get_user_ignore_case(&username).await? {
                Some(user) => {
                    members.insert(user.username);
                }
                None => {
                    debug!(%username, "Member not present locally; sync does not create users");
                }
            }
        }
        Ok(())
    }
}
