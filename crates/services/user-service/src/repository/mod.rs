//! Repository layer for data access.

mod collection;
mod memory_collection;
mod mongo_collection;
mod unavailable_collection;
mod user_repository;

pub use collection::{DocumentCollection, Filter};
pub use memory_collection::InMemoryCollection;
pub use mongo_collection::MongoCollection;
pub use unavailable_collection::UnavailableCollection;
pub use user_repository::{UserRepository, UserStore, DEFAULT_REQUEST_TIMEOUT};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use collection::MockDocumentCollection;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
