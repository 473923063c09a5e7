//! Integration tests for the identity store
//!
//! These run the store against an in-memory key-value store with no
//! simulated latency.

use async_trait::async_trait;
use auth::{AuthError, IdentityStore, NewUser, Role, Session, User};
use common::store::{KeyValueStore, MemoryStore, get_json, keys};
use common::{StoreError, StoreResult};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

/// In-memory store that can fail writes to one key, or stall after writing
/// a record that contains a marker
#[derive(Default)]
struct FaultyStore {
    inner: MemoryStore,
    failing_key: Mutex<Option<&'static str>>,
    stall: Mutex<Option<(&'static str, &'static str, Duration)>>,
}

impl FaultyStore {
    fn fail_writes_to(&self, key: Option<&'static str>) {
        *self.failing_key.lock().unwrap() = key;
    }

    fn stall_after_write(&self, key: &'static str, marker: &'static str, delay: Duration) {
        *self.stall.lock().unwrap() = Some((key, marker, delay));
    }
}

#[async_trait]
impl KeyValueStore for FaultyStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        if *self.failing_key.lock().unwrap() == Some(key) {
            return Err(StoreError::Io {
                key: key.to_string(),
                source: std::io::Error::other("write rejected"),
            });
        }

        self.inner.set(key, value).await?;

        let stall = *self.stall.lock().unwrap();
        if let Some((stall_key, marker, delay)) = stall {
            if stall_key == key && value.contains(marker) {
                tokio::time::sleep(delay).await;
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.inner.delete(key).await
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }
}

async fn open(store: Arc<dyn KeyValueStore>) -> IdentityStore {
    IdentityStore::load(store, Duration::ZERO)
        .await
        .expect("failed to open identity store")
}

fn candidate(username: &str, email: &str, role: Role) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password: "secret1".to_string(),
        role,
    }
}

/// Empty store with alice registered as the first owner
async fn bootstrapped() -> (Arc<dyn KeyValueStore>, IdentityStore, User) {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let identity = open(store.clone()).await;
    let alice = identity
        .register_user(candidate("alice", "a@x.com", Role::Owner), None)
        .await
        .expect("bootstrap owner registration failed");
    (store, identity, alice)
}

#[tokio::test]
async fn test_owner_bootstrap_then_login() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let identity = open(store.clone()).await;
    assert!(!identity.has_owner().await.unwrap());

    let alice = identity
        .register_user(candidate("alice", "a@x.com", Role::Owner), None)
        .await
        .unwrap();
    assert_eq!(alice.role, Role::Owner);
    assert_eq!(alice.created_by, None);
    assert!(identity.has_owner().await.unwrap());

    let session = identity.authenticate("a@x.com", "secret1").await.unwrap();
    assert_eq!(session.user, alice);

    // A wrong secret fails and the earlier session survives
    let err = identity.authenticate("a@x.com", "wrong").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
    assert_eq!(identity.current_user().await, Some(alice));
}

#[tokio::test]
async fn test_login_with_no_users() {
    let identity = open(Arc::new(MemoryStore::new())).await;

    let err = identity.authenticate("a@x.com", "secret1").await.unwrap_err();
    assert!(matches!(err, AuthError::NoUsersProvisioned));
    assert!(!identity.is_authenticated().await);
}

#[tokio::test]
async fn test_unknown_email_and_wrong_secret_look_the_same() {
    let (_, identity, _) = bootstrapped().await;

    let unknown = identity.authenticate("b@x.com", "secret1").await.unwrap_err();
    let wrong = identity.authenticate("a@x.com", "nope").await.unwrap_err();

    assert!(matches!(unknown, AuthError::UserNotFound));
    assert!(matches!(wrong, AuthError::InvalidCredentials));
    assert_eq!(unknown.user_message(), wrong.user_message());
    assert!(!identity.is_authenticated().await);
}

#[tokio::test]
async fn test_email_match_is_case_sensitive() {
    let (_, identity, _) = bootstrapped().await;
    assert_err!(identity.authenticate("A@X.COM", "secret1").await);
}

#[tokio::test]
async fn test_repeated_login_yields_equivalent_session() {
    let (_, identity, _) = bootstrapped().await;

    let first = identity.authenticate("a@x.com", "secret1").await.unwrap();
    let second = identity.authenticate("a@x.com", "secret1").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_end_session_is_idempotent() {
    let (store, identity, _) = bootstrapped().await;

    assert_ok!(identity.end_session().await);

    identity.authenticate("a@x.com", "secret1").await.unwrap();
    assert!(store.get(keys::CURRENT_SESSION).await.unwrap().is_some());

    assert_ok!(identity.end_session().await);
    assert_ok!(identity.end_session().await);
    assert_eq!(identity.current_user().await, None);
    assert_eq!(store.get(keys::CURRENT_SESSION).await.unwrap(), None);

    // Logging out never clears the owner flag
    assert!(identity.has_owner().await.unwrap());
}

#[tokio::test]
async fn test_session_restored_on_reload() {
    let (store, identity, alice) = bootstrapped().await;
    identity.authenticate("a@x.com", "secret1").await.unwrap();
    drop(identity);

    let reopened = open(store).await;
    assert_eq!(reopened.current_user().await, Some(alice));
}

#[tokio::test]
async fn test_only_owners_create_owners() {
    let (_, identity, alice) = bootstrapped().await;

    let admin = identity
        .register_user(candidate("bob", "b@x.com", Role::Admin), Some(&alice))
        .await
        .unwrap();
    assert_eq!(admin.created_by, Some(alice.id));

    let editor = identity
        .register_user(candidate("carol", "c@x.com", Role::Editor), Some(&admin))
        .await
        .unwrap();

    for requester in [None, Some(&admin), Some(&editor)] {
        let err = identity
            .register_user(candidate("mallory", "m@x.com", Role::Owner), requester)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Forbidden { role: Role::Owner }));
    }

    let owner = identity
        .register_user(candidate("dave", "d@x.com", Role::Owner), Some(&alice))
        .await
        .unwrap();
    assert_eq!(owner.role, Role::Owner);
}

#[tokio::test]
async fn test_editors_and_anonymous_callers_cannot_create_accounts() {
    let (_, identity, alice) = bootstrapped().await;
    let editor = identity
        .register_user(candidate("carol", "c@x.com", Role::Editor), Some(&alice))
        .await
        .unwrap();

    for role in [Role::Admin, Role::Editor] {
        let err = identity
            .register_user(candidate("eve", "e@x.com", role), Some(&editor))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Forbidden { .. }));

        let err = identity
            .register_user(candidate("eve", "e@x.com", role), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Forbidden { .. }));
    }
}

#[tokio::test]
async fn test_requester_role_is_read_from_registry() {
    let (_, identity, alice) = bootstrapped().await;
    let editor = identity
        .register_user(candidate("carol", "c@x.com", Role::Editor), Some(&alice))
        .await
        .unwrap();

    // A caller claiming a role it does not hold gets nothing
    let forged = User {
        role: Role::Owner,
        ..editor
    };
    let err = identity
        .register_user(candidate("eve", "e@x.com", Role::Owner), Some(&forged))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Forbidden { .. }));
}

#[tokio::test]
async fn test_first_account_must_be_owner() {
    let identity = open(Arc::new(MemoryStore::new())).await;

    let err = identity
        .register_user(candidate("bob", "b@x.com", Role::Admin), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Forbidden { role: Role::Admin }));
    assert!(identity.list_users().await.unwrap().is_empty());
    assert!(!identity.has_owner().await.unwrap());
}

#[tokio::test]
async fn test_duplicate_email_rejected_without_writes() {
    let (_, identity, alice) = bootstrapped().await;

    let err = identity
        .register_user(candidate("alice2", "a@x.com", Role::Editor), Some(&alice))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::DuplicateEmail { ref email } if email == "a@x.com"));
    assert_eq!(identity.list_users().await.unwrap(), vec![alice]);
}

#[tokio::test]
async fn test_invalid_input_reported_per_field() {
    let (_, identity, alice) = bootstrapped().await;

    let err = identity
        .register_user(candidate("", "not-an-email", Role::Editor), Some(&alice))
        .await
        .unwrap_err();
    let errors = match err {
        AuthError::Validation(errors) => errors,
        other => panic!("expected validation error, got {:?}", other),
    };
    assert_eq!(errors.get("username"), Some("Username is required"));
    assert_eq!(errors.get("email"), Some("Email is invalid"));
}

#[tokio::test]
async fn test_list_users_in_registration_order() {
    let (_, identity, alice) = bootstrapped().await;
    let bob = identity
        .register_user(candidate("bob", "b@x.com", Role::Admin), Some(&alice))
        .await
        .unwrap();
    let carol = identity
        .register_user(candidate("carol", "c@x.com", Role::Editor), Some(&bob))
        .await
        .unwrap();

    let users = identity.list_users().await.unwrap();
    assert_eq!(users, vec![alice, bob, carol]);
    assert_eq!(users, identity.list_users().await.unwrap());
}

#[tokio::test]
async fn test_concurrent_registration_same_email() {
    let (_, identity, alice) = bootstrapped().await;

    let (first, second) = tokio::join!(
        identity.register_user(candidate("bob", "b@x.com", Role::Editor), Some(&alice)),
        identity.register_user(candidate("bobby", "b@x.com", Role::Admin), Some(&alice)),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|r| matches!(r, Err(AuthError::DuplicateEmail { .. })))
            .count(),
        1
    );
    assert_eq!(identity.list_users().await.unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bootstrap_yields_one_owner() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let identity = Arc::new(open(store).await);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let identity = identity.clone();
            tokio::spawn(async move {
                identity
                    .register_user(
                        candidate(&format!("owner{i}"), "owner@x.com", Role::Owner),
                        None,
                    )
                    .await
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(identity.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_corrupt_registry_is_a_fault() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    store.set(keys::USER_REGISTRY, "[{broken").await.unwrap();
    let identity = open(store).await;

    let err = identity.authenticate("a@x.com", "secret1").await.unwrap_err();
    assert!(err.is_fault());
    assert!(matches!(err, AuthError::Fault(_)));
}

#[tokio::test]
async fn test_overlapping_logins_keep_session_and_record_in_step() {
    let faulty = Arc::new(FaultyStore::default());
    let store: Arc<dyn KeyValueStore> = faulty.clone();
    let identity = open(store.clone()).await;

    let alice = identity
        .register_user(candidate("alice", "a@x.com", Role::Owner), None)
        .await
        .unwrap();
    identity
        .register_user(candidate("bob", "b@x.com", Role::Admin), Some(&alice))
        .await
        .unwrap();

    // Alice's login is slow to return after persisting its session
    faulty.stall_after_write(keys::CURRENT_SESSION, "a@x.com", Duration::from_millis(100));

    let (first, second) = tokio::join!(identity.authenticate("a@x.com", "secret1"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        identity.authenticate("b@x.com", "secret1").await
    });
    assert_ok!(first);
    assert_ok!(second);

    let persisted: Option<Session> = get_json(store.as_ref(), keys::CURRENT_SESSION)
        .await
        .unwrap();
    let persisted = persisted.expect("session record missing");
    assert_eq!(identity.current_user().await, Some(persisted.user.clone()));

    // A restart lands on the same user
    let reopened = open(store).await;
    assert_eq!(reopened.current_user().await, Some(persisted.user));
}

#[tokio::test]
async fn test_failed_session_write_keeps_previous_session() {
    let faulty = Arc::new(FaultyStore::default());
    let store: Arc<dyn KeyValueStore> = faulty.clone();
    let identity = open(store).await;

    let alice = identity
        .register_user(candidate("alice", "a@x.com", Role::Owner), None)
        .await
        .unwrap();
    identity.authenticate("a@x.com", "secret1").await.unwrap();

    faulty.fail_writes_to(Some(keys::CURRENT_SESSION));
    let err = identity.authenticate("a@x.com", "secret1").await.unwrap_err();
    assert!(err.is_fault());
    assert_eq!(identity.current_user().await, Some(alice));
}

#[tokio::test]
async fn test_lost_owner_flag_does_not_block_login() {
    let faulty = Arc::new(FaultyStore::default());
    let store: Arc<dyn KeyValueStore> = faulty.clone();
    let identity = open(store.clone()).await;

    faulty.fail_writes_to(Some(keys::HAS_OWNER_FLAG));
    let err = identity
        .register_user(candidate("alice", "a@x.com", Role::Owner), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Fault(_)));

    // The owner was committed, so the installation moves on to login
    assert_eq!(store.get(keys::HAS_OWNER_FLAG).await.unwrap(), None);
    assert!(identity.has_owner().await.unwrap());
    let alice = identity.authenticate("a@x.com", "secret1").await.unwrap().user;

    // The next owner created restores the flag
    faulty.fail_writes_to(None);
    identity
        .register_user(candidate("dave", "d@x.com", Role::Owner), Some(&alice))
        .await
        .unwrap();
    let flag: Option<bool> = get_json(store.as_ref(), keys::HAS_OWNER_FLAG).await.unwrap();
    assert_eq!(flag, Some(true));
}

#[tokio::test]
async fn test_failed_registry_write_rolls_back_credential() {
    let faulty = Arc::new(FaultyStore::default());
    let store: Arc<dyn KeyValueStore> = faulty.clone();
    let identity = open(store.clone()).await;

    faulty.fail_writes_to(Some(keys::USER_REGISTRY));
    let err = identity
        .register_user(candidate("alice", "a@x.com", Role::Owner), None)
        .await
        .unwrap_err();
    assert!(err.is_fault());
    assert!(!identity.has_owner().await.unwrap());
    assert_eq!(
        store.get(keys::CREDENTIAL_TABLE).await.unwrap(),
        Some("{}".to_string())
    );

    // Bootstrap is still open once storage recovers
    faulty.fail_writes_to(None);
    assert_ok!(
        identity
            .register_user(candidate("alice", "a@x.com", Role::Owner), None)
            .await
    );
}
