//! Directory client configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DirectoryError, DirectoryResult};

/// Configuration for one LDAP server.
#[derive(Clone, Serialize, Deserialize)]
pub struct LdapConfig {
    /// LDAP server hostname or IP address.
    pub host: String,

    /// LDAP server port (389 for LDAP, 636 for LDAPS).
    #[serde(default = "default_ldap_port")]
    pub port: u16,

    /// Use SSL/TLS (LDAPS).
    #[serde(default)]
    pub use_ssl: bool,

    /// Use STARTTLS upgrade on a plain LDAP connection.
    #[serde(default)]
    pub use_starttls: bool,

    /// Base DN for all searches (e.g., "dc=example,dc=com").
    pub base_dn: String,

    /// Bind DN for authentication.
    pub bind_dn: String,

    /// Bind password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_password: Option<String>,

    /// Connect timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Per-search timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub search_timeout_secs: u64,

    /// LDAP filter selecting user entries.
    #[serde(default = "default_user_filter")]
    pub user_filter: String,

    /// Attribute holding the username on user entries.
    #[serde(default = "default_user_name_attr")]
    pub user_name_attr: String,

    /// LDAP filter selecting group entries.
    #[serde(default = "default_group_filter")]
    pub group_filter: String,

    /// Attribute holding the group name on group entries.
    #[serde(default = "default_group_name_attr")]
    pub group_name_attr: String,

    /// Attribute holding DN-valued group members.
    #[serde(default = "default_group_member_attr")]
    pub group_member_attr: String,

    /// Attribute holding posix members (bare usernames, legacy schema).
    #[serde(default = "default_posix_member_attr")]
    pub posix_member_attr: String,
}

impl std::fmt::Debug for LdapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("use_starttls", &self.use_starttls)
            .field("base_dn", &self.base_dn)
            .field("bind_dn", &self.bind_dn)
            .field(
                "bind_password",
                &self.bind_password.as_ref().map(|_| "***REDACTED***"),
            )
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("search_timeout_secs", &self.search_timeout_secs)
            .field("user_filter", &self.user_filter)
            .field("user_name_attr", &self.user_name_attr)
            .field("group_filter", &self.group_filter)
            .field("group_name_attr", &self.group_name_attr)
            .field("group_member_attr", &self.group_member_attr)
            .field("posix_member_attr", &self.posix_member_attr)
            .finish()
    }
}

fn default_ldap_port() -> u16 {
    389
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_filter() -> String {
    "(objectClass=inetOrgPerson)".to_string()
}

fn default_user_name_attr() -> String {
    "uid".to_string()
}

fn default_group_filter() -> String {
    "(objectClass=groupOfNames)".to_string()
}

fn default_group_name_attr() -> String {
    "cn".to_string()
}

fn default_group_member_attr() -> String {
    "member".to_string()
}

fn default_posix_member_attr() -> String {
    "memberUid".to_string()
}

impl LdapConfig {
    /// Create a config with required fields and defaults for the rest.
    pub fn new(
        host: impl Into<String>,
        base_dn: impl Into<String>,
        bind_dn: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: default_ldap_port(),
            use_ssl: false,
            use_starttls: false,
            base_dn: base_dn.into(),
            bind_dn: bind_dn.into(),
            bind_password: None,
            connect_timeout_secs: default_timeout_secs(),
            search_timeout_secs: default_timeout_secs(),
            user_filter: default_user_filter(),
            user_name_attr: default_user_name_attr(),
            group_filter: default_group_filter(),
            group_name_attr: default_group_name_attr(),
            group_member_attr: default_group_member_attr(),
            posix_member_attr: default_posix_member_attr(),
        }
    }

    /// Set the bind password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.bind_password = Some(password.into());
        self
    }

    /// Enable SSL (LDAPS) and switch to the LDAPS port.
    #[must_use]
    pub fn with_ssl(mut self) -> Self {
        self.use_ssl = true;
        self.port = 636;
        self
    }

    /// Enable STARTTLS.
    #[must_use]
    pub fn with_starttls(mut self) -> Self {
        self.use_starttls = true;
        self
    }

    /// Set connect and search timeouts in seconds.
    #[must_use]
    pub fn with_timeouts(mut self, connect_secs: u64, search_secs: u64) -> Self {
        self.connect_timeout_secs = connect_secs;
        self.search_timeout_secs = search_secs;
        self
    }

    /// The LDAP URL for this server.
    #[must_use]
    pub fn url(&self) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> DirectoryResult<()> {
        if self.host.is_empty() {
            return Err(DirectoryError::invalid_configuration("host is required"));
        }
        if self.base_dn.is_empty() {
            return Err(DirectoryError::invalid_configuration("base_dn is required"));
        }
        if self.bind_dn.is_empty() {
            return Err(DirectoryError::invalid_configuration("bind_dn is required"));
        }
        if self.use_ssl && self.use_starttls {
            return Err(DirectoryError::invalid_configuration(
                "cannot use both SSL and STARTTLS",
            ));
        }
        Ok(())
    }
}

/// Named directory server configurations.
///
/// Sync requests address a server by name; an empty name selects the sole
/// configured server when there is exactly one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LdapServers {
    servers: BTreeMap<String, LdapConfig>,
}

impl LdapServers {
    /// Create an empty server map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named server.
    pub fn with_server(mut self, name: impl Into<String>, config: LdapConfig) -> Self {
        self.servers.insert(name.into(), config);
        self
    }

    /// Look up a server by name.
    pub fn get(&self, name: &str) -> DirectoryResult<&LdapConfig> {
        if name.is_empty() && self.servers.len() == 1 {
            if let Some(config) = self.servers.values().next() {
                return Ok(config);
            }
        }
        self.servers.get(name).ok_or_else(|| {
            DirectoryError::invalid_configuration(format!("unknown directory server '{name}'"))
        })
    }

    /// Names of all configured servers.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.servers.keys().map(String::as_str)
    }
}
