//! Shared fixtures for tests: a live server on a random port, seeded rows and
//! an in-memory object store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::{
    app,
    auth::{password::hash_password, AuthResponse},
    recipes::{fixtures, repo as recipes, Category, Recipe, RecipeInput},
    state::AppState,
    storage::StorageClient,
    users::{repo::NewUser, User, DEFAULT_AVATAR},
};

pub const PASSWORD: &str = "correct-horse-battery";

/// Keeps uploaded objects in memory.
#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<HashMap<String, (Bytes, String)>>,
}

impl FakeStorage {
    pub fn get(&self, key: &str) -> Option<(Bytes, String)> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StorageClient for FakeStorage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (body, content_type.to_string()));
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String> {
        Ok(format!("https://storage.test/bucket/{key}?expires={seconds}"))
    }
}

pub struct TestApp {
    pub base_url: String,
    pub state: AppState,
    pub http: reqwest::Client,
    pub storage: Option<Arc<FakeStorage>>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::start(None).await
    }

    pub async fn spawn_with_storage() -> Self {
        Self::start(Some(Arc::new(FakeStorage::default()))).await
    }

    async fn start(storage: Option<Arc<FakeStorage>>) -> Self {
        let base = AppState::in_memory().await.unwrap();
        let state = AppState::from_parts(
            base.db,
            base.config,
            storage.clone().map(|s| s as Arc<dyn StorageClient>),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = app::build_app(state.clone());
        tokio::spawn(async move {
            let _ = app::run(listener, router).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            http: reqwest::Client::new(),
            storage,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, email: &str, name: &str) -> AuthResponse {
        let res = self
            .http
            .post(self.url("/register"))
            .json(&json!({ "email": email, "password": PASSWORD, "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::CREATED, "register {email}");
        res.json().await.unwrap()
    }

    pub async fn create_recipe(&self, session: &AuthResponse, input: RecipeInput) -> Recipe {
        let res = self
            .http
            .post(self.url("/recipes"))
            .bearer_auth(&session.access_token)
            .json(&input)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::CREATED, "create {}", input.title);
        res.json().await.unwrap()
    }
}

/// A user row written straight to the database.
pub async fn seed_user(db: &SqlitePool, email: &str) -> Uuid {
    let hash = hash_password(PASSWORD).unwrap();
    User::create(
        db,
        NewUser {
            email,
            password_hash: &hash,
            name: "Seeded Cook",
            avatar: DEFAULT_AVATAR,
            bio: "",
            dietary_preferences: &[],
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn seed_recipe(db: &SqlitePool, author: Uuid, title: &str, category: Category) -> Recipe {
    recipes::insert(db, Uuid::new_v4(), author, &fixtures::input(title, category))
        .await
        .unwrap()
}
