//! In-memory port fakes and request helpers shared by the handler tests.

use crate::config::Config;
use crate::web::rest::api_router;
use crate::web::state::{AppState, ZipLocks};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use outbreak_core::domain::{DayEntry, User, UserCredentials, ZipRecord};
use outbreak_core::ports::{
    DatabaseService, PortError, PortResult, TextGenerationService, ZipMetadataService,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryDb {
    pub zips: Mutex<HashMap<String, ZipRecord>>,
    pub users: Mutex<Vec<(User, String)>>,
    pub unavailable: bool,
}

impl InMemoryDb {
    pub fn with_zip(self, zip: &str, population: Option<i64>, entries: Vec<DayEntry>) -> Self {
        self.zips.lock().unwrap().insert(
            zip.to_string(),
            ZipRecord {
                zip: zip.to_string(),
                entries,
                population,
            },
        );
        self
    }

    fn check(&self) -> PortResult<()> {
        if self.unavailable {
            Err(PortError::Unexpected("database is down".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DatabaseService for InMemoryDb {
    async fn get_zip_record(&self, zip: &str) -> PortResult<ZipRecord> {
        self.check()?;
        self.zips
            .lock()
            .unwrap()
            .get(zip)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("ZIP {} not found", zip)))
    }

    async fn save_zip_entries(&self, zip: &str, entries: &[DayEntry]) -> PortResult<()> {
        self.check()?;
        let mut zips = self.zips.lock().unwrap();
        let record = zips
            .get_mut(zip)
            .ok_or_else(|| PortError::NotFound(format!("ZIP {} not found", zip)))?;
        record.entries = entries.to_vec();
        Ok(())
    }

    async fn upsert_zip_population(&self, zip: &str, population: Option<i64>) -> PortResult<()> {
        self.check()?;
        self.zips
            .lock()
            .unwrap()
            .entry(zip.to_string())
            .or_insert_with(|| ZipRecord {
                zip: zip.to_string(),
                entries: Vec::new(),
                population: None,
            })
            .population = population;
        Ok(())
    }

    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|(user, _)| user.email == email) {
            return Err(PortError::Conflict(
                "User with this email already exists!".to_string(),
            ));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
        };
        users.push((user.clone(), hashed_password.to_string()));
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.check()?;
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|(user, _)| user.email == email)
            .map(|(user, hash)| UserCredentials {
                user_id: user.id,
                email: user.email.clone(),
                hashed_password: hash.clone(),
            })
            .ok_or_else(|| PortError::NotFound("User not found!".to_string()))
    }

    async fn ping(&self) -> PortResult<()> {
        self.check()
    }
}

/// Records every request and answers with a canned reply.
#[derive(Default)]
pub struct FakeTextGenerator {
    pub reply: String,
    pub fail: bool,
    pub requests: Mutex<Vec<(String, String)>>,
}

impl FakeTextGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl TextGenerationService for FakeTextGenerator {
    async fn generate(&self, system: &str, prompt: &str) -> PortResult<String> {
        self.requests
            .lock()
            .unwrap()
            .push((system.to_string(), prompt.to_string()));
        if self.fail {
            return Err(PortError::Unexpected("upstream 503 from api.openai.com".to_string()));
        }
        Ok(self.reply.clone())
    }
}

#[derive(Default)]
pub struct FakeZipMetadata {
    pub rows: HashMap<String, String>,
}

impl FakeZipMetadata {
    pub fn with_row(mut self, zip: &str, description: &str) -> Self {
        self.rows.insert(zip.to_string(), description.to_string());
        self
    }
}

#[async_trait]
impl ZipMetadataService for FakeZipMetadata {
    async fn describe_zip(&self, zip: &str) -> PortResult<String> {
        self.rows
            .get(zip)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("No data found for ZIP code '{}'", zip)))
    }

    async fn population_rows(&self) -> PortResult<Vec<(String, Option<i64>)>> {
        Ok(self.rows.keys().map(|zip| (zip.clone(), None)).collect())
    }
}

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://localhost/test".to_string()),
        _ => None,
    })
    .unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub db: Arc<InMemoryDb>,
    pub text_generator: Arc<FakeTextGenerator>,
    pub report_locks: Arc<ZipLocks>,
}

pub fn test_app(
    db: InMemoryDb,
    text_generator: FakeTextGenerator,
    zip_metadata: FakeZipMetadata,
) -> TestApp {
    let db = Arc::new(db);
    let text_generator = Arc::new(text_generator);
    let report_locks = Arc::new(ZipLocks::new());
    let state = Arc::new(AppState {
        db: db.clone(),
        config: Arc::new(test_config()),
        text_generator: text_generator.clone(),
        zip_metadata: Arc::new(zip_metadata),
        report_locks: report_locks.clone(),
    });
    TestApp {
        router: api_router(state),
        db,
        text_generator,
        report_locks,
    }
}

pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    send_raw(router, method, uri, body.map(|json| json.to_string())).await
}

/// Like `send`, but the body is passed through untouched as `application/json`.
pub async fn send_raw(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<String>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(raw) => {
            builder = builder.header("content-type", "application/json");
            Body::from(raw)
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 64)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}
