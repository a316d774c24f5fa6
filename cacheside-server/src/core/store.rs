use super::record::{Note, NoteCreate, NoteUpdate, User, UserCreate, UserUpdate};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors from the durable store. Unlike cache errors these propagate
/// unchanged to the caller, and a write that fails here must never be
/// followed by cache invalidation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered: {0}")]
    EmailTaken(String),
}

/// Result type alias for primary-store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for super::error::ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmailTaken(email) => Self::Conflict(format!("email already registered: {email}")),
        }
    }
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<u64, User>,
    notes: BTreeMap<u64, Note>,
    next_user_id: u64,
    next_note_id: u64,
}

/// In-memory system of record for users and notes.
///
/// Absence is reported as `None`, never as an error; constraint
/// violations (unique email) are the only write failures.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_user(&self, id: u64) -> Option<User> {
        self.tables.read().users.get(&id).cloned()
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        let tables = self.tables.read();
        tables.users.values().find(|u| u.email == email).cloned()
    }

    pub fn list_users(&self, offset: usize, limit: usize) -> Vec<User> {
        let tables = self.tables.read();
        tables.users.values().skip(offset).take(limit).cloned().collect()
    }

    pub fn create_user(&self, payload: UserCreate) -> StoreResult<User> {
        let mut tables = self.tables.write();

        if tables.users.values().any(|u| u.email == payload.email) {
            return Err(StoreError::EmailTaken(payload.email));
        }

        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            name: payload.name,
            email: payload.email,
            created_at: Utc::now(),
            updated_at: None,
        };
        debug!("store CREATE user id={}", user.id);
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    /// Apply a partial update. Returns None when the user does not exist.
    pub fn update_user(&self, id: u64, payload: UserUpdate) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write();

        if let Some(email) = &payload.email {
            if tables.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::EmailTaken(email.clone()));
            }
        }

        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = payload.name {
            user.name = name;
        }
        if let Some(email) = payload.email {
            user.email = email;
        }
        user.updated_at = Some(Utc::now());
        debug!("store UPDATE user id={}", id);
        Ok(Some(user.clone()))
    }

    pub fn find_note(&self, id: u64) -> Option<Note> {
        self.tables.read().notes.get(&id).cloned()
    }

    pub fn list_notes(&self, offset: usize, limit: usize) -> Vec<Note> {
        let tables = self.tables.read();
        tables.notes.values().skip(offset).take(limit).cloned().collect()
    }

    pub fn notes_for_user(&self, user_id: u64) -> Vec<Note> {
        let tables = self.tables.read();
        tables
            .notes
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn create_note(&self, payload: NoteCreate) -> Note {
        let mut tables = self.tables.write();

        tables.next_note_id += 1;
        let note = Note {
            id: tables.next_note_id,
            title: payload.title,
            content: payload.content,
            user_id: payload.user_id,
            created_at: Utc::now(),
            updated_at: None,
        };
        debug!("store CREATE note id={}", note.id);
        tables.notes.insert(note.id, note.clone());
        note
    }

    /// Apply a partial update. Returns None when the note does not exist.
    pub fn update_note(&self, id: u64, payload: NoteUpdate) -> Option<Note> {
        let mut tables = self.tables.write();
        let note = tables.notes.get_mut(&id)?;

        if let Some(title) = payload.title {
            note.title = title;
        }
        if let Some(content) = payload.content {
            note.content = content;
        }
        note.updated_at = Some(Utc::now());
        debug!("store UPDATE note id={}", id);
        Some(note.clone())
    }

    pub fn delete_note(&self, id: u64) -> bool {
        let mut tables = self.tables.write();
        let removed = tables.notes.remove(&id).is_some();
        if removed {
            debug!("store DELETE note id={}", id);
        }
        removed
    }
}
