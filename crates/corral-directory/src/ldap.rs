//! `ldap3`-backed directory client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::attrs::{strip_domain, truncate_chars, NAME_MAX_CHARS};
use crate::client::{DirectoryClient, SearchScope};
use crate::config::LdapConfig;
use crate::error::{DirectoryError, DirectoryResult};
use crate::pattern::glob_to_ldap_value;
use crate::records::{DirectoryGroup, DirectoryUser};

const USER_FIRST_NAME_ATTR: &str = "givenName";
const USER_LAST_NAME_ATTR: &str = "sn";
const USER_EMAIL_ATTR: &str = "mail";
const USER_MEMBER_OF_ATTR: &str = "memberOf";

/// Directory client over a shared, lazily-created LDAP connection.
///
/// The connection is created on first use and reused across requests until
/// [`invalidate`](Self::invalidate) drops it or a transport error forces a
/// reconnect. Creation races resolve by re-checking under the write lock, so
/// concurrent first callers settle on a single published handle.
pub struct LdapDirectoryClient {
    config: LdapConfig,
    connection: Arc<RwLock<Option<Ldap>>>,
}

impl LdapDirectoryClient {
    /// Create a client for the given server; no connection is made yet.
    pub fn new(config: LdapConfig) -> DirectoryResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            connection: Arc::new(RwLock::new(None)),
        })
    }

    /// Drop the cached connection; the next request reconnects.
    pub async fn invalidate(&self) {
        let mut guard = self.connection.write().await;
        if let Some(mut ldap) = guard.take() {
            debug!(url = %self.config.url(), "Invalidating cached directory connection");
            let _ = ldap.unbind().await;
        }
    }

    /// Get the shared connection, creating and publishing it if necessary.
    async fn connection(&self) -> DirectoryResult<Ldap> {
        {
            let guard = self.connection.read().await;
            if let Some(ref conn) = *guard {
                return Ok(conn.clone());
            }
        }

        let conn = self.create_connection().await?;

        // Re-check under the write lock: if another caller published a
        // connection while we were connecting, keep theirs.
        let mut guard = self.connection.write().await;
        match *guard {
            Some(ref existing) => Ok(existing.clone()),
            None => {
                *guard = Some(conn.clone());
                Ok(conn)
            }
        }
    }

    async fn create_connection(&self) -> DirectoryResult<Ldap> {
        let url = self.config.url();
        debug!(url = %url, "Connecting to directory server");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(self.config.connect_timeout_secs))
            .set_starttls(self.config.use_starttls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| {
                DirectoryError::unavailable_with_source(
                    format!("failed to connect to directory server at {url}"),
                    e,
                )
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "Directory connection driver error");
            }
        });

        let bind_dn = &self.config.bind_dn;
        let bind_password = self.config.bind_password.as_deref().unwrap_or("");
        debug!(bind_dn = %bind_dn, "Binding to directory");

        let bound = ldap
            .simple_bind(bind_dn, bind_password)
            .await
            .map_err(|e| DirectoryError::unavailable_with_source("bind request failed", e))?;
        if bound.rc != 0 {
            return Err(DirectoryError::BindFailed {
                bind_dn: bind_dn.clone(),
            });
        }

        Ok(ldap)
    }

    async fn search(
        &self,
        base: &str,
        scope: Scope,
        filter: &str,
        attrs: Vec<&str>,
    ) -> DirectoryResult<Vec<SearchEntry>> {
        let mut ldap = self.connection().await?;
        let outcome = ldap
            .with_timeout(Duration::from_secs(self.config.search_timeout_secs))
            .search(base, scope, filter, attrs)
            .await;

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                // A broken pipe poisons the shared handle; force a reconnect.
                self.invalidate().await;
                return Err(DirectoryError::unavailable_with_source(
                    format!("search failed under {base}"),
                    e,
                ));
            }
        };

        match result.success() {
            Ok((entries, _)) => Ok(entries.into_iter().map(SearchEntry::construct).collect()),
            // noSuchObject: the search base does not exist; an empty answer,
            // not a transport failure.
            Err(ldap3::LdapError::LdapResult { result }) if result.rc == 32 => Ok(Vec::new()),
            Err(e) => Err(DirectoryError::unavailable_with_source(
                format!("search failed under {base}"),
                e,
            )),
        }
    }

    fn entry_to_user(&self, entry: SearchEntry) -> Option<DirectoryUser> {
        let raw_username = first_attr(&entry, &self.config.user_name_attr)?;
        let username = strip_domain(&raw_username).to_string();
        let directory_username = if username == raw_username {
            None
        } else {
            Some(raw_username)
        };

        Some(DirectoryUser {
            dn: entry.dn.clone(),
            username,
            directory_username,
            first_name: first_attr(&entry, USER_FIRST_NAME_ATTR)
                .map(|v| truncate_chars(&v, NAME_MAX_CHARS)),
            last_name: first_attr(&entry, USER_LAST_NAME_ATTR)
                .map(|v| truncate_chars(&v, NAME_MAX_CHARS)),
            email: first_attr(&entry, USER_EMAIL_ATTR),
            group_dns: all_attrs(&entry, USER_MEMBER_OF_ATTR),
        })
    }

    fn entry_to_group(&self, entry: SearchEntry) -> Option<DirectoryGroup> {
        let name = first_attr(&entry, &self.config.group_name_attr)?;
        Some(DirectoryGroup {
            dn: entry.dn.clone(),
            name,
            member_dns: all_attrs(&entry, &self.config.group_member_attr),
            posix_members: all_attrs(&entry, &self.config.posix_member_attr),
        })
    }

    fn name_filter(&self, base_filter: &str, attr: &str, pattern: &str) -> String {
        format!(
            "(&{}({}={}))",
            wrap_filter(base_filter),
            attr,
            glob_to_ldap_value(pattern)
        )
    }
}

#[async_trait]
impl DirectoryClient for LdapDirectoryClient {
    #[instrument(skip(self), fields(url = %self.config.url()))]
    async fn find_users(
        &self,
        pattern: &str,
        by_dn: bool,
        scope: SearchScope,
    ) -> DirectoryResult<Vec<DirectoryUser>> {
        let attrs = vec![
            self.config.user_name_attr.as_str(),
            USER_FIRST_NAME_ATTR,
            USER_LAST_NAME_ATTR,
            USER_EMAIL_ATTR,
            USER_MEMBER_OF_ATTR,
        ];

        let entries = if by_dn {
            self.search(
                pattern,
                scope_to_ldap(scope),
                &wrap_filter(&self.config.user_filter),
                attrs,
            )
            .await?
        } else {
            let filter = self.name_filter(
                &self.config.user_filter,
                &self.config.user_name_attr,
                pattern,
            );
            self.search(&self.config.base_dn, Scope::Subtree, &filter, attrs)
                .await?
        };

        let users: Vec<DirectoryUser> = entries
            .into_iter()
            .filter_map(|e| self.entry_to_user(e))
            .collect();
        debug!(pattern, by_dn, count = users.len(), "Directory user search");
        Ok(users)
    }

    #[instrument(skip(self), fields(url = %self.config.url()))]
    async fn find_groups(
        &self,
        pattern: &str,
        by_dn: bool,
        scope: SearchScope,
    ) -> DirectoryResult<Vec<DirectoryGroup>> {
        let attrs = vec![
            self.config.group_name_attr.as_str(),
            self.config.group_member_attr.as_str(),
            self.config.posix_member_attr.as_str(),
        ];

        let entries = if by_dn {
            self.search(
                pattern,
                scope_to_ldap(scope),
                &wrap_filter(&self.config.group_filter),
                attrs,
            )
            .await?
        } else {
            let filter = self.name_filter(
                &self.config.group_filter,
                &self.config.group_name_attr,
                pattern,
            );
            self.search(&self.config.base_dn, Scope::Subtree, &filter, attrs)
                .await?
        };

        let groups: Vec<DirectoryGroup> = entries
            .into_iter()
            .filter_map(|e| self.entry_to_group(e))
            .collect();
        debug!(pattern, by_dn, count = groups.len(), "Directory group search");
        Ok(groups)
    }
}

fn scope_to_ldap(scope: SearchScope) -> Scope {
    match scope {
        SearchScope::Base => Scope::Base,
        SearchScope::Subtree => Scope::Subtree,
    }
}

fn wrap_filter(filter: &str) -> String {
    let trimmed = filter.trim();
    if trimmed.starts_with('(') {
        trimmed.to_string()
    } else {
        format!("({trimmed})")
    }
}

fn first_attr(entry: &SearchEntry, attr: &str) -> Option<String> {
    entry
        .attrs
        .get(attr)
        .and_then(|values| values.first())
        .filter(|v| !v.is_empty())
        .cloned()
}

fn all_attrs(entry: &SearchEntry, attr: &str) -> Vec<String> {
    entry.attrs.get(attr).cloned().unwrap_or_default()
}
