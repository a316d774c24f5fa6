use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::error::{ApiError, Result};

/// Schema version stamped into every cached payload. Bump when a cached
/// record shape changes; entries carrying an older version are treated
/// as misses and overwritten by the reload path.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A note owned by a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub user_id: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A user together with their notes, the read shape of the profile endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub notes: Vec<Note>,
}

impl UserProfile {
    pub fn new(user: User, notes: Vec<Note>) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
            notes,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
}

/// Partial update, absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoteCreate {
    pub title: String,
    pub content: String,
    pub user_id: u64,
}

/// Partial update, absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Versioned envelope wrapping every value placed in the cache
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    schema: u32,
    data: T,
}

/// Serialize a record into its cached representation
pub fn encode_cached<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let envelope = Envelope {
        schema: CACHE_SCHEMA_VERSION,
        data: value,
    };
    serde_json::to_vec(&envelope).map_err(|e| ApiError::Serialization(e.to_string()))
}

/// Decode a cached payload. Returns None on any malformed or
/// version-mismatched payload so the caller falls back to the primary
/// store and overwrites the entry.
pub fn decode_cached<T: DeserializeOwned>(bytes: &[u8]) -> Option<T> {
    let envelope: Envelope<T> = serde_json::from_slice(bytes).ok()?;
    if envelope.schema != CACHE_SCHEMA_VERSION {
        return None;
    }
    Some(envelope.data)
}
