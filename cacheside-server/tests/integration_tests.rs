use cacheside_server::core::{CacheAside, CacheConfig, MemoryCache, MemoryStore, NoteService};
use cacheside_server::{AppState, create_router};
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Helper to spawn a test server
async fn spawn_test_server() -> String {
    let cache = MemoryCache::new(CacheConfig::default());
    let accessor = CacheAside::new(cache, 300);
    let service = Arc::new(NoteService::new(MemoryStore::new(), accessor));

    let app = create_router(AppState { service });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = format!("http://{}", addr);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give server time to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    url
}

async fn create_user(client: &Client, base_url: &str, name: &str, email: &str) -> serde_json::Value {
    let res = client
        .post(format!("{}/users", base_url))
        .json(&json!({"name": name, "email": email}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    res.json().await.unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    let res = client
        .get(format!("{}/health", base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "cacheside");
}

#[tokio::test]
async fn test_user_create_and_profile() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    let user = create_user(&client, &base_url, "Alice", "alice@example.com").await;
    let user_id = user["id"].as_u64().unwrap();

    let res = client
        .get(format!("{}/users/{}", base_url, user_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let profile: serde_json::Value = res.json().await.unwrap();
    assert_eq!(profile["name"], "Alice");
    assert_eq!(profile["email"], "alice@example.com");
    assert_eq!(profile["notes"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_duplicate_email_conflict() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    create_user(&client, &base_url, "Alice", "alice@example.com").await;

    let res = client
        .post(format!("{}/users", base_url))
        .json(&json!({"name": "Impostor", "email": "alice@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 409);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["code"], 409);
}

#[tokio::test]
async fn test_missing_records_are_404() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    let res = client
        .get(format!("{}/users/999", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    let res = client
        .get(format!("{}/notes/999", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    let res = client
        .delete(format!("{}/notes/999", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_note_for_unknown_owner_is_404() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    let res = client
        .post(format!("{}/notes", base_url))
        .json(&json!({"title": "orphan", "content": "", "user_id": 42}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_note_update_is_never_served_stale() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    let user = create_user(&client, &base_url, "Alice", "alice@example.com").await;
    let user_id = user["id"].as_u64().unwrap();

    // write A
    let res = client
        .post(format!("{}/notes", base_url))
        .json(&json!({"title": "A", "content": "body", "user_id": user_id}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let note: serde_json::Value = res.json().await.unwrap();
    let note_id = note["id"].as_u64().unwrap();

    // read from a cold cache (miss then populate)
    let res = client
        .get(format!("{}/notes/{}", base_url, note_id))
        .send()
        .await
        .unwrap();
    let note: serde_json::Value = res.json().await.unwrap();
    assert_eq!(note["title"], "A");

    // write B
    let res = client
        .put(format!("{}/notes/{}", base_url, note_id))
        .json(&json!({"title": "B"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    // the cached "A" must not survive the write
    let res = client
        .get(format!("{}/notes/{}", base_url, note_id))
        .send()
        .await
        .unwrap();
    let note: serde_json::Value = res.json().await.unwrap();
    assert_eq!(note["title"], "B");
    assert_eq!(note["content"], "body");
}

#[tokio::test]
async fn test_profile_reflects_note_writes() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    let user = create_user(&client, &base_url, "Alice", "alice@example.com").await;
    let user_id = user["id"].as_u64().unwrap();

    // Warm the profile cache
    let res = client
        .get(format!("{}/users/{}", base_url, user_id))
        .send()
        .await
        .unwrap();
    let profile: serde_json::Value = res.json().await.unwrap();
    assert_eq!(profile["notes"].as_array().unwrap().len(), 0);

    let res = client
        .post(format!("{}/notes", base_url))
        .json(&json!({"title": "first", "content": "", "user_id": user_id}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let note: serde_json::Value = res.json().await.unwrap();
    let note_id = note["id"].as_u64().unwrap();

    let res = client
        .get(format!("{}/users/{}", base_url, user_id))
        .send()
        .await
        .unwrap();
    let profile: serde_json::Value = res.json().await.unwrap();
    assert_eq!(profile["notes"].as_array().unwrap().len(), 1);

    // Deleting the note empties the profile again
    let res = client
        .delete(format!("{}/notes/{}", base_url, note_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["deleted"], true);

    let res = client
        .get(format!("{}/users/{}", base_url, user_id))
        .send()
        .await
        .unwrap();
    let profile: serde_json::Value = res.json().await.unwrap();
    assert_eq!(profile["notes"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_note_listing_pagination() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    let user = create_user(&client, &base_url, "Alice", "alice@example.com").await;
    let user_id = user["id"].as_u64().unwrap();

    for i in 0..5 {
        let res = client
            .post(format!("{}/notes", base_url))
            .json(&json!({"title": format!("note {i}"), "content": "", "user_id": user_id}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
    }

    let res = client
        .get(format!("{}/notes?offset=1&limit=2", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let notes: serde_json::Value = res.json().await.unwrap();
    let notes = notes.as_array().unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0]["title"], "note 1");
}

#[tokio::test]
async fn test_cache_clear_and_stats() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    let user = create_user(&client, &base_url, "Alice", "alice@example.com").await;
    let user_id = user["id"].as_u64().unwrap();

    // Two reads populate two cache entries
    client
        .get(format!("{}/users/{}", base_url, user_id))
        .send()
        .await
        .unwrap();
    client
        .get(format!("{}/notes", base_url))
        .send()
        .await
        .unwrap();

    let res = client
        .get(format!("{}/cache/stats", base_url))
        .send()
        .await
        .unwrap();
    let stats: serde_json::Value = res.json().await.unwrap();
    assert_eq!(stats["total_keys"], 2);

    let res = client
        .post(format!("{}/cache/clear", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["cleared"], 2);

    let res = client
        .get(format!("{}/cache/stats", base_url))
        .send()
        .await
        .unwrap();
    let stats: serde_json::Value = res.json().await.unwrap();
    assert_eq!(stats["total_keys"], 0);
}

#[tokio::test]
async fn test_repeat_read_hits_cache() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    let user = create_user(&client, &base_url, "Alice", "alice@example.com").await;
    let user_id = user["id"].as_u64().unwrap();

    for _ in 0..3 {
        let res = client
            .get(format!("{}/users/{}", base_url, user_id))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
    }

    let res = client
        .get(format!("{}/cache/stats", base_url))
        .send()
        .await
        .unwrap();
    let stats: serde_json::Value = res.json().await.unwrap();
    assert_eq!(stats["misses"], 1);
    assert_eq!(stats["hits"], 2);
}

#[tokio::test]
async fn test_user_update_propagates() {
    let base_url = spawn_test_server().await;
    let client = Client::new();

    let user = create_user(&client, &base_url, "Alice", "alice@example.com").await;
    let user_id = user["id"].as_u64().unwrap();

    // Warm the profile, then rename
    client
        .get(format!("{}/users/{}", base_url, user_id))
        .send()
        .await
        .unwrap();

    let res = client
        .put(format!("{}/users/{}", base_url, user_id))
        .json(&json!({"name": "Alicia"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let updated: serde_json::Value = res.json().await.unwrap();
    assert_eq!(updated["name"], "Alicia");
    assert!(updated["updated_at"].is_string());

    let res = client
        .get(format!("{}/users/{}", base_url, user_id))
        .send()
        .await
        .unwrap();
    let profile: serde_json::Value = res.json().await.unwrap();
    assert_eq!(profile["name"], "Alicia");
}
