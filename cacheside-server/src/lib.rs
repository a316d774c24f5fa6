pub mod config;
pub mod core;
pub mod server;

// Re-export commonly used types
pub use config::ServerConfig;
pub use core::{
    ApiError, CacheAside, CacheBackend, CacheConfig, CacheError, CacheStats, MemoryCache,
    MemoryStore, Note, NoteCreate, NoteService, NoteUpdate, StoreError, User, UserCreate,
    UserProfile, UserUpdate,
};
pub use server::{AppState, create_router};
