//! A seeded, mutable in-memory directory.
//!
//! Mimics the behavior of the LDAP-backed client: case-insensitive anchored
//! glob matching for name patterns, exact DN matching for by-DN lookups, and
//! descendant lookup for subtree group-by-DN searches. Mutation hooks fake
//! changes on the directory side between sync passes.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use corral_directory::pattern::glob_to_regex;
use corral_directory::{
    DirectoryClient, DirectoryError, DirectoryGroup, DirectoryResult, DirectoryUser, SearchScope,
};

/// A 151-character username, over the store's 150-character limit.
pub fn long_username() -> String {
    "A".repeat(151)
}

#[derive(Default)]
struct Data {
    /// Users keyed by username.
    users: BTreeMap<String, DirectoryUser>,
    /// Groups keyed by group name.
    groups: BTreeMap<String, DirectoryGroup>,
    /// When set, every query fails as if the transport were down.
    unavailable: bool,
}

/// Shared mutable directory handed to the engine under test.
#[derive(Clone)]
pub struct MockDirectory {
    data: Arc<Mutex<Data>>,
}

fn user(
    dn: &str,
    username: &str,
    first: Option<&str>,
    last: Option<&str>,
    email: &str,
    groups: Vec<&str>,
) -> DirectoryUser {
    DirectoryUser {
        dn: dn.to_string(),
        username: username.to_string(),
        directory_username: None,
        first_name: first.map(str::to_string),
        last_name: last.map(str::to_string),
        email: Some(email.to_string()),
        group_dns: groups.into_iter().map(str::to_string).collect(),
    }
}

fn group(dn: &str, name: &str, members: Vec<String>, posix_members: Vec<&str>) -> DirectoryGroup {
    DirectoryGroup {
        dn: dn.to_string(),
        name: name.to_string(),
        member_dns: members,
        posix_members: posix_members.into_iter().map(str::to_string).collect(),
    }
}

impl MockDirectory {
    /// The standard fixture: the stooges, a DN-subordinate admin group, a
    /// declared-nesting chain, and posix-schema groups.
    pub fn seeded() -> Self {
        let long = long_username();
        let long_dn = format!("uid={long},ou=People,dc=example,dc=com");

        let mut users = BTreeMap::new();
        for u in [
            user(
                "uid=moe,ou=People,dc=example,dc=com",
                "moe",
                Some("Moe"),
                None,
                "moe@stooges.com",
                vec!["cn=TestUsers,ou=Groups,dc=example,dc=com"],
            ),
            user(
                "uid=lårry,ou=People,dc=example,dc=com",
                "lårry",
                Some("Larry"),
                Some("Stooge"),
                "larry@stooges.com",
                vec![
                    "cn=TestUsers,ou=Groups,dc=example,dc=com",
                    "cn=Test Administrators,cn=TestUsers,ou=Groups,dc=example,dc=com",
                ],
            ),
            user(
                "uid=curly,ou=People,dc=example,dc=com",
                "curly",
                Some("Curly"),
                Some("Stooge"),
                "curly@stooges.com",
                vec![
                    "cn=TestUsers,ou=Groups,dc=example,dc=com",
                    "cn=Test Administrators,cn=TestUsers,ou=Groups,dc=example,dc=com",
                ],
            ),
            user(
                "uid=Rock,ou=People,dc=example,dc=com",
                "Rock",
                Some("rock"),
                Some("man"),
                "rockman@stooges.com",
                vec!["cn=Test Administrators,cn=TestUsers,ou=Groups,dc=example,dc=com"],
            ),
            user(
                "uid=nestedguy,ou=People,dc=example,dc=com",
                "nestedguy",
                Some("nested"),
                Some("guy"),
                "nestedguy@stooges.com",
                vec!["cn=NestedGroup,ou=Groups,dc=example,dc=com"],
            ),
            user(
                "uid=otherguy,ou=People,dc=example,dc=com",
                "otherguy",
                Some("Other"),
                Some("Guy"),
                "other@guy.com",
                vec![],
            ),
            user(
                "uid=posix_person,ou=People,dc=example,dc=com",
                "posix_person",
                Some("pos"),
                Some("ix"),
                "pos@ix.com",
                vec![],
            ),
            user(
                "uid=posix_person2,ou=People,dc=example,dc=com",
                "posix_person2",
                Some("pos"),
                Some("ix"),
                "pos@ix.com",
                vec![],
            ),
            user(
                "uid=user with space,ou=People,dc=example,dc=com",
                "user with space",
                Some("user"),
                Some("space"),
                "user@space.com",
                vec![],
            ),
            user(
                "uid=user without space,ou=People,dc=example,dc=com",
                "spaceless",
                Some("user"),
                Some("space"),
                "user@space.com",
                vec![],
            ),
            user(
                &long_dn,
                &long,
                Some("toolong"),
                Some("username"),
                "toolong@username.com",
                vec![],
            ),
            user(
                "uid=test_longfirstname,ou=People,dc=example,dc=com",
                "test_longfirstname",
                Some("test_longfirstname_test_longfirstname"),
                Some("username"),
                "toolong@username.com",
                vec![],
            ),
        ] {
            users.insert(u.username.clone(), u);
        }

        let mut groups = BTreeMap::new();
        for g in [
            group(
                "cn=TestUsers,ou=Groups,dc=example,dc=com",
                "TestUsers",
                vec![
                    "uid=moe,ou=People,dc=example,dc=com".to_string(),
                    "uid=lårry,ou=People,dc=example,dc=com".to_string(),
                    "uid=curly,ou=People,dc=example,dc=com".to_string(),
                    long_dn.clone(),
                ],
                vec![],
            ),
            group(
                "cn=Test Administrators,cn=TestUsers,ou=Groups,dc=example,dc=com",
                "Test Administrators",
                vec![
                    "uid=Rock,ou=People,dc=example,dc=com".to_string(),
                    "uid=lårry,ou=People,dc=example,dc=com".to_string(),
                    "uid=curly,ou=People,dc=example,dc=com".to_string(),
                    long_dn,
                ],
                vec![],
            ),
            group(
                "cn=OtherGroup,cn=TestUsers,ou=Groups,dc=example,dc=com",
                "OtherGroup",
                vec![],
                vec![],
            ),
            group(
                "cn=NestedGroups,ou=Groups,dc=example,dc=com",
                "NestedGroups",
                vec!["cn=NestedGroup,ou=Groups,dc=example,dc=com".to_string()],
                vec![],
            ),
            group(
                "cn=NestedGroup,ou=Groups,dc=example,dc=com",
                "NestedGroup",
                vec!["uid=nestedguy,ou=People,dc=example,dc=com".to_string()],
                vec![],
            ),
            group(
                "cn=NestedPosixGroups,ou=Groups,dc=example,dc=com",
                "NestedPosixGroups",
                vec!["cn=PosixGroup,ou=Groups,dc=example,dc=com".to_string()],
                vec![],
            ),
            group(
                "cn=PosixGroup,ou=Groups,dc=example,dc=com",
                "PosixGroup",
                vec![],
                vec!["posix_person", "lårry"],
            ),
            group(
                "cn=PosixGroup1,cn=PosixGroup,ou=Groups,dc=example,dc=com",
                "PosixGroup1",
                vec![],
                vec!["posix_person2"],
            ),
        ] {
            groups.insert(g.name.clone(), g);
        }

        Self {
            data: Arc::new(Mutex::new(Data {
                users,
                groups,
                unavailable: false,
            })),
        }
    }

    /// Fake a transport outage.
    pub fn set_unavailable(&self, down: bool) {
        self.data.lock().unwrap().unavailable = down;
    }

    /// Add a member DN to a group.
    pub fn add_user_group(&self, user_dn: &str, group_name: &str) {
        let mut data = self.data.lock().unwrap();
        if let Some(group) = data.groups.get_mut(group_name) {
            group.member_dns.push(user_dn.to_string());
        }
    }

    /// Remove a member DN from a group.
    pub fn remove_user_group(&self, user_dn: &str, group_name: &str) {
        let mut data = self.data.lock().unwrap();
        if let Some(group) = data.groups.get_mut(group_name) {
            group.member_dns.retain(|dn| dn != user_dn);
        }
    }

    /// Add a posix member to a group.
    pub fn add_posix_user_group(&self, username: &str, group_name: &str) {
        let mut data = self.data.lock().unwrap();
        if let Some(group) = data.groups.get_mut(group_name) {
            group.posix_members.push(username.to_string());
        }
    }

    /// Remove a posix member from a group.
    pub fn remove_posix_user_group(&self, username: &str, group_name: &str) {
        let mut data = self.data.lock().unwrap();
        if let Some(group) = data.groups.get_mut(group_name) {
            group.posix_members.retain(|name| name != username);
        }
    }

    /// Drop one claimed group DN from a user's record.
    pub fn remove_user_claim(&self, username: &str, group_dn: &str) {
        let mut data = self.data.lock().unwrap();
        if let Some(user) = data.users.get_mut(username) {
            user.group_dns.retain(|dn| dn != group_dn);
        }
    }

    /// Overwrite a user's first name on the directory side.
    pub fn set_user_first_name(&self, username: &str, first_name: &str) {
        let mut data = self.data.lock().unwrap();
        if let Some(user) = data.users.get_mut(username) {
            user.first_name = Some(first_name.to_string());
        }
    }
}

#[async_trait]
impl DirectoryClient for MockDirectory {
    async fn find_users(
        &self,
        pattern: &str,
        by_dn: bool,
        _scope: SearchScope,
    ) -> DirectoryResult<Vec<DirectoryUser>> {
        let data = self.data.lock().unwrap();
        if data.unavailable {
            return Err(DirectoryError::unavailable("directory is down"));
        }
        if by_dn {
            return Ok(data
                .users
                .values()
                .filter(|u| u.dn == pattern)
                .cloned()
                .collect());
        }
        let matcher = glob_to_regex(pattern)?;
        Ok(data
            .users
            .values()
            .filter(|u| matcher.is_match(&u.username))
            .cloned()
            .collect())
    }

    async fn find_groups(
        &self,
        pattern: &str,
        by_dn: bool,
        scope: SearchScope,
    ) -> DirectoryResult<Vec<DirectoryGroup>> {
        let data = self.data.lock().unwrap();
        if data.unavailable {
            return Err(DirectoryError::unavailable("directory is down"));
        }
        if by_dn {
            let mut found: Vec<DirectoryGroup> = data
                .groups
                .values()
                .filter(|g| g.dn == pattern)
                .cloned()
                .collect();
            if scope == SearchScope::Subtree && !found.is_empty() {
                let descendants: Vec<DirectoryGroup> = data
                    .groups
                    .values()
                    .filter(|g| g.dn != pattern && g.dn.ends_with(pattern))
                    .cloned()
                    .collect();
                found.extend(descendants);
            }
            return Ok(found);
        }
        let matcher = glob_to_regex(pattern)?;
        Ok(data
            .groups
            .values()
            .filter(|g| matcher.is_match(&g.name))
            .cloned()
            .collect())
    }
}
