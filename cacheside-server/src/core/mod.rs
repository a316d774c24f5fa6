pub mod accessor;
pub mod cache;
pub mod error;
pub mod record;
pub mod service;
pub mod store;
pub mod types;

pub use accessor::CacheAside;
pub use cache::{CacheBackend, CacheError, MemoryCache};
pub use error::{ApiError, Result};
pub use record::{Note, NoteCreate, NoteUpdate, User, UserCreate, UserProfile, UserUpdate};
pub use service::NoteService;
pub use store::{MemoryStore, StoreError};
pub use types::{CacheConfig, CacheStats};
