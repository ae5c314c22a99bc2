//! User import behavior: attribute handling, collision preservation, case
//! policies, and per-user validation failures.

mod helpers;

use std::sync::Arc;

use helpers::mock_directory::MockDirectory;

use corral_store::{CreationMethod, IdentityStore, MemoryStore, NewUser};
use corral_sync::{ImportUserOptions, SyncConfig, SyncEngine};

fn engine(
    directory: &MockDirectory,
    store: &MemoryStore,
    config: SyncConfig,
) -> SyncEngine<MockDirectory, MemoryStore> {
    SyncEngine::new(Arc::new(directory.clone()), Arc::new(store.clone()), config)
}

#[tokio::test]
async fn import_creates_external_user_with_directory_attributes() {
    let directory = MockDirectory::seeded();
    let store = MemoryStore::new();
    let engine = engine(&directory, &store, SyncConfig::default());

    let report = engine
        .import_users("lårry", &ImportUserOptions::default())
        .await
        .unwrap();
    assert_eq!(report.users_created, 1);

    let larry = store.get_user("lårry").await.unwrap().unwrap();
    assert_eq!(larry.first_name, "Larry");
    assert_eq!(larry.last_name, "Stooge");
    assert_eq!(larry.email, "larry@stooges.com");
    assert_eq!(larry.creation_method, CreationMethod::External);
}

#[tokio::test]
async fn import_preserves_existing_user_on_name_collision() {
    let directory = MockDirectory::seeded();
    let store = MemoryStore::new();
    store
        .create_user(NewUser::local("otherguy").with_names("Different", "Guy"))
        .await
        .unwrap();
    let engine = engine(&directory, &store, SyncConfig::default());

    let report = engine
        .import_users("otherguy", &ImportUserOptions::default())
        .await
        .unwrap();
    assert_eq!(report.users_created, 0);

    let otherguy = store.get_user("otherguy").await.unwrap().unwrap();
    assert_eq!(otherguy.first_name, "Different");
    assert_eq!(otherguy.last_name, "Guy");
    assert_eq!(otherguy.creation_method, CreationMethod::Local);
}

#[tokio::test]
async fn import_with_sync_groups_attaches_claimed_managed_groups() {
    let directory = MockDirectory::seeded();
    let store = MemoryStore::new();
    let engine = engine(&directory, &store, SyncConfig::default());

    // Groups must already be imported or membership will not sync.
    engine
        .import_groups("TestUsers", &Default::default())
        .await
        .unwrap();
    engine
        .import_groups("Test Administrators", &Default::default())
        .await
        .unwrap();

    let report = engine
        .import_users(
            "curly",
            &ImportUserOptions {
                sync_groups: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(report.users_created, 1);
    assert_eq!(report.memberships_added, 2);

    let curly = store.get_user("curly").await.unwrap().unwrap();
    assert_eq!(curly.email, "curly@stooges.com");
    assert_eq!(store.groups_of_user("curly").await.unwrap().len(), 2);
}

#[tokio::test]
async fn import_without_sync_groups_attaches_nothing() {
    let directory = MockDirectory::seeded();
    let store = MemoryStore::new();
    let engine = engine(&directory, &store, SyncConfig::default());

    engine
        .import_groups("TestUsers", &Default::default())
        .await
        .unwrap();
    engine
        .import_users("curly", &ImportUserOptions::default())
        .await
        .unwrap();
    assert!(store.groups_of_user("curly").await.unwrap().is_empty());
}

#[tokio::test]
async fn ignore_case_stores_canonical_lowercase() {
    let directory = MockDirectory::seeded();
    let store = MemoryStore::new();
    let engine = engine(
        &directory,
        &store,
        SyncConfig {
            ignore_username_case: true,
            ..Default::default()
        },
    );

    engine
        .import_users("Lårry", &ImportUserOptions::default())
        .await
        .unwrap();
    assert!(store.get_user("Lårry").await.unwrap().is_none());
    assert!(store.get_user("lårry").await.unwrap().is_some());

    // A mixed-case directory entry folds as well.
    engine
        .import_users("Rock", &ImportUserOptions::default())
        .await
        .unwrap();
    assert!(store.get_user("Rock").await.unwrap().is_none());
    assert!(store.get_user("rock").await.unwrap().is_some());
}

#[tokio::test]
async fn force_lowercase_applies_to_incoming_names() {
    let directory = MockDirectory::seeded();
    let store = MemoryStore::new();
    let engine = engine(
        &directory,
        &store,
        SyncConfig {
            force_username_lowercase: true,
            ..Default::default()
        },
    );

    engine
        .import_users("Rock", &ImportUserOptions::default())
        .await
        .unwrap();
    assert!(store.get_user("Rock").await.unwrap().is_none());
    assert!(store.get_user("rock").await.unwrap().is_some());
}

#[tokio::test]
async fn force_uppercase_wins_over_other_case_flags() {
    let directory = MockDirectory::seeded();
    let store = MemoryStore::new();
    let engine = engine(
        &directory,
        &store,
        SyncConfig {
            ignore_username_case: true,
            force_username_lowercase: true,
            force_username_uppercase: true,
            ..Default::default()
        },
    );

    engine
        .import_users("Rock", &ImportUserOptions::default())
        .await
        .unwrap();
    assert!(store.get_user("ROCK").await.unwrap().is_some());
    assert!(store.get_user("rock").await.unwrap().is_none());
}

#[tokio::test]
async fn username_with_whitespace_is_recorded_as_failure() {
    let directory = MockDirectory::seeded();
    let store = MemoryStore::new();
    let engine = engine(&directory, &store, SyncConfig::default());

    let report = engine
        .import_users("user with space", &ImportUserOptions::default())
        .await
        .unwrap();
    assert_eq!(report.matched_users, 1);
    assert_eq!(report.users_created, 0);
    assert_eq!(report.failed_users.len(), 1);
    assert!(store.users().await.is_empty());
}

#[tokio::test]
async fn import_by_dn_uses_username_attribute_not_dn() {
    let directory = MockDirectory::seeded();
    let store = MemoryStore::new();
    let engine = engine(&directory, &store, SyncConfig::default());

    // DN contains spaces, the username attribute does not.
    let report = engine
        .import_users(
            "uid=user without space,ou=People,dc=example,dc=com",
            &ImportUserOptions {
                by_dn: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(report.users_created, 1);
    assert!(store.get_user("spaceless").await.unwrap().is_some());

    // Here the username attribute itself carries whitespace.
    let report = engine
        .import_users(
            "uid=user with space,ou=People,dc=example,dc=com",
            &ImportUserOptions {
                by_dn: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(report.users_created, 0);
    assert_eq!(report.failed_users.len(), 1);
}

#[tokio::test]
async fn wildcard_pattern_imports_every_match() {
    let directory = MockDirectory::seeded();
    let store = MemoryStore::new();
    let engine = engine(&directory, &store, SyncConfig::default());

    let report = engine
        .import_users("*rr*", &ImportUserOptions::default())
        .await
        .unwrap();
    // lårry and curly both contain "rr".
    assert_eq!(report.users_created, 2);
    assert!(store.get_user("lårry").await.unwrap().is_some());
    assert!(store.get_user("curly").await.unwrap().is_some());
}

#[tokio::test]
async fn unmatched_pattern_reports_zero_matches() {
    let directory = MockDirectory::seeded();
    let store = MemoryStore::new();
    let engine = engine(&directory, &store, SyncConfig::default());

    let report = engine
        .import_users("bad_name", &ImportUserOptions::default())
        .await
        .unwrap();
    assert_eq!(report.matched_users, 0);
    assert_eq!(report.users_created, 0);
}

#[tokio::test]
async fn overlong_first_name_is_recorded_as_failure() {
    let directory = MockDirectory::seeded();
    let store = MemoryStore::new();
    let engine = engine(&directory, &store, SyncConfig::default());

    let report = engine
        .import_users("test_longfirstname", &ImportUserOptions::default())
        .await
        .unwrap();
    assert_eq!(report.users_created, 0);
    assert_eq!(report.failed_users.len(), 1);
    assert_eq!(report.failed_usernames(), "test_longfirstname");
}
