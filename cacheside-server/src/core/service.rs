use super::accessor::{
    CacheAside, NOTES_PATTERN, USERS_PATTERN, note_key, notes_page_key, user_profile_key,
    users_page_key,
};
use super::cache::{CacheBackend, MemoryCache};
use super::error::{ApiError, Result};
use super::record::{Note, NoteCreate, NoteUpdate, User, UserCreate, UserUpdate, UserProfile};
use super::store::MemoryStore;
use super::types::CacheStats;
use tracing::info;

/// Application service composing the primary store and the cache-aside
/// accessor.
///
/// Every write goes to the primary store first and invalidates cache
/// entries only after the store confirms it; a store failure
/// short-circuits before any cache call. Reads go through the accessor,
/// which keeps the cache an optional accelerator.
#[derive(Clone)]
pub struct NoteService<C> {
    store: MemoryStore,
    accessor: CacheAside<C>,
}

impl<C: CacheBackend> NoteService<C> {
    pub fn new(store: MemoryStore, accessor: CacheAside<C>) -> Self {
        Self { store, accessor }
    }

    pub async fn create_user(&self, payload: UserCreate) -> Result<User> {
        let user = self.store.create_user(payload)?;

        self.accessor.invalidate(USERS_PATTERN).await;
        info!("created user id={}", user.id);
        Ok(user)
    }

    /// Cached profile read: the user together with their notes.
    pub async fn get_user_profile(&self, id: u64) -> Result<Option<UserProfile>> {
        let store = self.store.clone();
        self.accessor
            .fetch(&user_profile_key(id), || async move {
                let Some(user) = store.find_user(id) else {
                    return Ok(None);
                };
                let notes = store.notes_for_user(id);
                Ok(Some(UserProfile::new(user, notes)))
            })
            .await
    }

    pub async fn update_user(&self, id: u64, payload: UserUpdate) -> Result<Option<User>> {
        let Some(user) = self.store.update_user(id, payload)? else {
            return Ok(None);
        };

        self.accessor.invalidate_key(&user_profile_key(id)).await;
        self.accessor.invalidate(USERS_PATTERN).await;
        Ok(Some(user))
    }

    pub async fn list_users(&self, offset: usize, limit: usize) -> Result<Vec<User>> {
        let store = self.store.clone();
        let page = self
            .accessor
            .fetch(&users_page_key(offset, limit), || async move {
                Ok(Some(store.list_users(offset, limit)))
            })
            .await?;
        Ok(page.unwrap_or_default())
    }

    pub async fn get_note(&self, id: u64) -> Result<Option<Note>> {
        let store = self.store.clone();
        self.accessor
            .fetch(&note_key(id), || async move { Ok(store.find_note(id)) })
            .await
    }

    pub async fn list_notes(&self, offset: usize, limit: usize) -> Result<Vec<Note>> {
        let store = self.store.clone();
        let page = self
            .accessor
            .fetch(&notes_page_key(offset, limit), || async move {
                Ok(Some(store.list_notes(offset, limit)))
            })
            .await?;
        Ok(page.unwrap_or_default())
    }

    pub async fn create_note(&self, payload: NoteCreate) -> Result<Note> {
        if self.store.find_user(payload.user_id).is_none() {
            return Err(ApiError::NotFound(format!("user {}", payload.user_id)));
        }

        let note = self.store.create_note(payload);

        self.accessor
            .invalidate_key(&user_profile_key(note.user_id))
            .await;
        self.accessor.invalidate(NOTES_PATTERN).await;
        info!("created note id={}", note.id);
        Ok(note)
    }

    pub async fn update_note(&self, id: u64, payload: NoteUpdate) -> Result<Option<Note>> {
        // The owning profile key needs the user_id, look the note up first
        let Some(existing) = self.store.find_note(id) else {
            return Ok(None);
        };

        let Some(note) = self.store.update_note(id, payload) else {
            return Ok(None);
        };

        self.accessor.invalidate_key(&note_key(id)).await;
        self.accessor
            .invalidate_key(&user_profile_key(existing.user_id))
            .await;
        self.accessor.invalidate(NOTES_PATTERN).await;
        Ok(Some(note))
    }

    pub async fn delete_note(&self, id: u64) -> Result<bool> {
        let Some(existing) = self.store.find_note(id) else {
            return Ok(false);
        };

        if !self.store.delete_note(id) {
            return Ok(false);
        }

        self.accessor.invalidate_key(&note_key(id)).await;
        self.accessor
            .invalidate_key(&user_profile_key(existing.user_id))
            .await;
        self.accessor.invalidate(NOTES_PATTERN).await;
        Ok(true)
    }

    /// Flush every cache entry, returning how many were removed
    pub async fn clear_cache(&self) -> usize {
        let count = self.accessor.invalidate("*").await;
        info!("cache cleared, {} entries removed", count);
        count
    }
}

impl NoteService<MemoryCache> {
    /// Hit/miss counters of the in-memory cache backend
    pub fn cache_stats(&self) -> CacheStats {
        self.accessor.cache().stats()
    }
}
