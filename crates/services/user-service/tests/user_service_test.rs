//! User service integration tests.
//!
//! Run the full service and store stack against an in-memory collection with the
//! same unique constraints as the MongoDB deployment.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Barrier;

use common::{AppError, AppResult};
use domain::{AuthResult, Login, PasswordHasher, User, FIELD_CUSTOMER_NUMBER};
use user_service_lib::repository::{
    DocumentCollection, Filter, InMemoryCollection, UnavailableCollection, UserRepository,
    UserStore,
};
use user_service_lib::service::{UserManager, UserService};

struct Harness {
    collection: Arc<InMemoryCollection<User>>,
    service: UserManager,
}

fn harness_with(hasher: PasswordHasher) -> Harness {
    let collection =
        Arc::new(InMemoryCollection::<User>::new().with_unique_field(FIELD_CUSTOMER_NUMBER));
    let repo = Arc::new(UserStore::new(collection.clone()));
    Harness {
        collection,
        service: UserManager::with_hasher(repo, hasher),
    }
}

// Fewer iterations keep the suite fast; the default hasher has its own test below.
fn harness() -> Harness {
    harness_with(PasswordHasher::new().with_iterations(1_000))
}

fn profile(email: &str, password: &str) -> User {
    User {
        first_name: Some("Ada".to_string()),
        last_name: Some("Lovelace".to_string()),
        address: Some("Main Street 1".to_string()),
        postal_code: Some(1234),
        city: Some("London".to_string()),
        email_address: Some(email.to_string()),
        phone_number: Some("+44 20 0000 0000".to_string()),
        password: Some(password.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_sequential_customer_numbers() {
    let h = harness();

    let mut numbers = Vec::new();
    for i in 0..5 {
        let user = h
            .service
            .create_user(profile(&format!("user{}@example.com", i), "pw"))
            .await
            .unwrap();
        numbers.push(user.customer_number);
    }

    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    assert_eq!(h.collection.len(), 5);
}

#[tokio::test]
async fn test_numbering_continues_after_delete_of_earlier_user() {
    let h = harness();

    let first = h.service.create_user(profile("a@example.com", "pw")).await.unwrap();
    h.service.create_user(profile("b@example.com", "pw")).await.unwrap();
    assert!(h.service.delete_user(&first.id).await.unwrap());

    let third = h.service.create_user(profile("c@example.com", "pw")).await.unwrap();
    assert_eq!(third.customer_number, 3);
}

#[tokio::test]
async fn test_get_after_create_returns_stored_record() {
    let h = harness();

    let created = h.service.create_user(profile("a@b.com", "secret")).await.unwrap();
    let fetched = h.service.get_user(&created.id).await.unwrap();

    assert_eq!(fetched, Some(created.clone()));
    assert_ne!(created.password.as_deref(), Some("secret"));
    assert!(!created.id.is_empty());
}

#[tokio::test]
async fn test_get_unknown_id() {
    let h = harness();
    assert!(h.service.get_user("does-not-exist").await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_in_insertion_order() {
    let h = harness();
    assert!(h.service.list_users().await.unwrap().is_empty());

    h.service.create_user(profile("a@example.com", "pw")).await.unwrap();
    h.service.create_user(profile("b@example.com", "pw")).await.unwrap();

    let emails: Vec<_> = h
        .service
        .list_users()
        .await
        .unwrap()
        .into_iter()
        .filter_map(|u| u.email_address)
        .collect();
    assert_eq!(emails, vec!["a@example.com", "b@example.com"]);
}

#[tokio::test]
async fn test_login_matches_exact_password_only() {
    let h = harness();
    let created = h.service.create_user(profile("a@b.com", "secret")).await.unwrap();

    let ok = h.service.login(&Login::new("a@b.com", "secret")).await.unwrap();
    assert_eq!(ok, AuthResult::matched(created.id));

    for (email, password) in [
        ("a@b.com", "wrong"),
        ("a@b.com", "Secret"),
        ("a@b.com", ""),
        ("nobody@b.com", "secret"),
    ] {
        let result = h.service.login(&Login::new(email, password)).await.unwrap();
        assert_eq!(result, AuthResult::rejected(), "{} / {:?}", email, password);
    }
}

#[tokio::test]
async fn test_end_to_end_with_default_hasher() {
    let h = harness_with(PasswordHasher::new());

    let created = h.service.create_user(profile("a@b.com", "secret")).await.unwrap();
    assert_eq!(
        created.password.as_deref(),
        Some("MWAZ4Ls/SWg/3J6ft5t8dRhgqM4iQFPjAC7j3Ex0W4k=")
    );

    let ok = h.service.login(&Login::new("a@b.com", "secret")).await.unwrap();
    assert!(ok.matched);
    assert_eq!(ok.id, created.id);

    let wrong = h.service.login(&Login::new("a@b.com", "wrong")).await.unwrap();
    assert!(!wrong.matched);
}

#[tokio::test]
async fn test_delete_then_get() {
    let h = harness();
    let created = h.service.create_user(profile("a@b.com", "pw")).await.unwrap();

    assert!(h.service.delete_user(&created.id).await.unwrap());
    assert!(h.service.get_user(&created.id).await.unwrap().is_none());
    assert!(!h.service.delete_user(&created.id).await.unwrap());
    assert!(h.collection.is_empty());
}

#[tokio::test]
async fn test_update_unknown_leaves_collection_unchanged() {
    let h = harness();
    let created = h.service.create_user(profile("a@b.com", "pw")).await.unwrap();

    let result = h
        .service
        .update_user("missing", profile("x@b.com", "pw"))
        .await
        .unwrap();

    assert!(result.is_none());
    assert_eq!(h.service.list_users().await.unwrap(), vec![created]);
}

#[tokio::test]
async fn test_update_writes_record_as_given() {
    let h = harness();
    let created = h.service.create_user(profile("a@b.com", "secret")).await.unwrap();

    // Customer number and password are not carried over by the store
    let replacement = User {
        city: Some("Paris".to_string()),
        ..Default::default()
    };
    let updated = h
        .service
        .update_user(&created.id, replacement)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.customer_number, 0);
    assert!(updated.password.is_none());
    assert_eq!(h.service.get_user(&created.id).await.unwrap(), Some(updated));

    let login = h.service.login(&Login::new("a@b.com", "secret")).await.unwrap();
    assert!(!login.matched);
}

#[tokio::test]
async fn test_update_keeping_hash_preserves_login() {
    let h = harness();
    let created = h.service.create_user(profile("a@b.com", "secret")).await.unwrap();

    let replacement = User {
        phone_number: Some("555-0100".to_string()),
        ..created.clone()
    };
    h.service
        .update_user(&created.id, replacement)
        .await
        .unwrap()
        .unwrap();

    let login = h.service.login(&Login::new("a@b.com", "secret")).await.unwrap();
    assert!(login.matched);
}

#[tokio::test]
async fn test_update_cannot_change_id() {
    let h = harness();
    let created = h.service.create_user(profile("a@b.com", "pw")).await.unwrap();

    let replacement = User {
        id: "other".to_string(),
        city: Some("Oslo".to_string()),
        ..created.clone()
    };
    let updated = h
        .service
        .update_user(&created.id, replacement)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert!(h.service.get_user("other").await.unwrap().is_none());
}

#[tokio::test]
async fn test_invalid_arguments() {
    let h = harness();

    for result in [
        h.service.get_user("").await.map(|_| ()),
        h.service.update_user(" ", User::default()).await.map(|_| ()),
        h.service.delete_user("").await.map(|_| ()),
        h.service.login(&Login::default()).await.map(|_| ()),
    ] {
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }
}

#[tokio::test]
async fn test_store_next_customer_number() {
    let collection =
        Arc::new(InMemoryCollection::<User>::new().with_unique_field(FIELD_CUSTOMER_NUMBER));
    let store = UserStore::new(collection.clone());

    let first = store.create(profile("a@example.com", "pw")).await.unwrap();
    let second = store.create(profile("b@example.com", "pw")).await.unwrap();

    assert_ne!(first.customer_number, second.customer_number);
    assert_eq!(store.next_customer_number().await.unwrap(), 3);
}

#[tokio::test]
async fn test_unavailable_store() {
    let repo = Arc::new(UserStore::new(Arc::new(UnavailableCollection::new(
        "connection refused",
    ))));
    let service = UserManager::with_hasher(repo, PasswordHasher::new().with_iterations(1_000));

    let err = service.list_users().await.unwrap_err();
    assert!(matches!(err, AppError::StorageUnavailable(_)));
    assert!(err.is_retryable());

    assert!(matches!(
        service.create_user(profile("a@b.com", "pw")).await,
        Err(AppError::StorageUnavailable(_))
    ));
    assert!(matches!(
        service.login(&Login::new("a@b.com", "pw")).await,
        Err(AppError::StorageUnavailable(_))
    ));
}

/// In-memory collection that holds the first `readers` customer-number reads
/// until all of them have happened, so concurrent creates see the same maximum.
struct GatedCollection {
    inner: InMemoryCollection<User>,
    readers: usize,
    gate: Barrier,
    reads: AtomicUsize,
    conflicts: AtomicUsize,
}

impl GatedCollection {
    fn new(readers: usize) -> Self {
        Self {
            inner: InMemoryCollection::new().with_unique_field(FIELD_CUSTOMER_NUMBER),
            readers,
            gate: Barrier::new(readers),
            reads: AtomicUsize::new(0),
            conflicts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DocumentCollection<User> for GatedCollection {
    async fn insert_one(&self, record: User) -> AppResult<()> {
        let result = self.inner.insert_one(record).await;
        if matches!(result, Err(AppError::Conflict(_))) {
            self.conflicts.fetch_add(1, Ordering::SeqCst);
        }
        result
    }

    async fn find_one(&self, filter: Filter) -> AppResult<Option<User>> {
        self.inner.find_one(filter).await
    }

    async fn find_many(&self, filter: Filter) -> AppResult<Vec<User>> {
        self.inner.find_many(filter).await
    }

    async fn find_top_one_sorted_descending(&self, field: &'static str) -> AppResult<Option<User>> {
        let top = self.inner.find_top_one_sorted_descending(field).await;
        if self.reads.fetch_add(1, Ordering::SeqCst) < self.readers {
            self.gate.wait().await;
        }
        top
    }

    async fn replace_one(&self, filter: Filter, record: User) -> AppResult<u64> {
        self.inner.replace_one(filter, record).await
    }

    async fn delete_one(&self, filter: Filter) -> AppResult<u64> {
        self.inner.delete_one(filter).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_retry_on_duplicate_customer_number() {
    const CREATORS: usize = 4;

    let collection = Arc::new(GatedCollection::new(CREATORS));
    let repo = Arc::new(UserStore::new(collection.clone()));
    let service = Arc::new(UserManager::with_hasher(
        repo,
        PasswordHasher::new().with_iterations(1_000),
    ));

    let handles: Vec<_> = (0..CREATORS)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .create_user(profile(&format!("c{}@example.com", i), "pw"))
                    .await
            })
        })
        .collect();

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.push(handle.await.unwrap().unwrap().customer_number);
    }
    numbers.sort_unstable();

    assert_eq!(numbers, vec![1, 2, 3, 4]);
    // All four read the same maximum, so three lost the first insert
    assert!(collection.conflicts.load(Ordering::SeqCst) >= CREATORS - 1);
}

#[tokio::test]
async fn test_update_rejects_customer_number_held_by_another_user() {
    let h = harness();
    let a = h.service.create_user(profile("a@b.com", "pw")).await.unwrap();
    let b = h.service.create_user(profile("b@b.com", "pw")).await.unwrap();

    let without_number = |city: &str| User {
        city: Some(city.to_string()),
        ..Default::default()
    };

    // Omitted number is written as 0
    let first = h
        .service
        .update_user(&a.id, without_number("Paris"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.customer_number, 0);

    let err = h
        .service
        .update_user(&b.id, without_number("Oslo"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(ref msg) if msg.contains(FIELD_CUSTOMER_NUMBER)));
    assert!(!err.is_retryable());
    assert_eq!(h.service.get_user(&b.id).await.unwrap(), Some(b));
}
