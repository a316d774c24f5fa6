use crate::core::{
    ApiError, MemoryCache, Note, NoteCreate, NoteService, NoteUpdate, User, UserCreate,
    UserProfile, UserUpdate,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<NoteService<MemoryCache>>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: u64,
}

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub cleared: usize,
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "cacheside",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// POST /users
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<UserCreate>,
) -> Result<Json<User>, ApiError> {
    let user = state.service.create_user(payload).await?;
    Ok(Json(user))
}

/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.service.list_users(page.offset, page.limit).await?;
    Ok(Json(users))
}

/// GET /users/{id} - cached profile with the user's notes
pub async fn get_user_profile(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = state
        .service
        .get_user_profile(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {id}")))?;
    Ok(Json(profile))
}

/// PUT /users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .service
        .update_user(id, payload)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {id}")))?;
    Ok(Json(user))
}

/// GET /notes
pub async fn list_notes(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = state.service.list_notes(page.offset, page.limit).await?;
    Ok(Json(notes))
}

/// GET /notes/{id}
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Note>, ApiError> {
    let note = state
        .service
        .get_note(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("note {id}")))?;
    Ok(Json(note))
}

/// POST /notes
pub async fn create_note(
    State(state): State<AppState>,
    Json(payload): Json<NoteCreate>,
) -> Result<Json<Note>, ApiError> {
    let note = state.service.create_note(payload).await?;
    Ok(Json(note))
}

/// PUT /notes/{id}
pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<NoteUpdate>,
) -> Result<Json<Note>, ApiError> {
    let note = state
        .service
        .update_note(id, payload)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("note {id}")))?;
    Ok(Json(note))
}

/// DELETE /notes/{id}
pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let deleted = state.service.delete_note(id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("note {id}")));
    }
    Ok(Json(DeleteResponse { deleted, id }))
}

/// POST /cache/clear - administrative full flush
pub async fn clear_cache(State(state): State<AppState>) -> Json<ClearCacheResponse> {
    let cleared = state.service.clear_cache().await;
    Json(ClearCacheResponse { cleared })
}

/// GET /cache/stats
pub async fn cache_stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.service.cache_stats();
    Json(json!({
        "total_keys": stats.total_keys,
        "operations": {
            "gets": stats.gets,
            "sets": stats.sets,
            "dels": stats.dels,
            "pattern_dels": stats.pattern_dels,
        },
        "hits": stats.hits,
        "misses": stats.misses,
        "hit_rate": stats.hit_rate(),
    }))
}
