//! In-memory collaborators for driving the router without PostgreSQL or Redis.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use gridpulse_api::AppState;
use gridpulse_api::config::ApiConfig;
use gridpulse_core::auth::AuthError;
use gridpulse_core::auth::policy::AccountPolicy;
use gridpulse_core::auth::queries::{AccountRepository, RepositoryError};
use gridpulse_core::health::{LivenessProber, Pinger, ProbeError};
use gridpulse_core::models::auth::{Account, NewAccount};
use gridpulse_core::session::{SessionCache, SessionError};
use tower::ServiceExt;

pub const SECRET: &str = "test-secret";

#[derive(Default)]
pub struct MemoryAccounts {
    accounts: Mutex<Vec<Account>>,
    pub unavailable: AtomicBool,
    /// Every call waits forever.
    pub hanging: AtomicBool,
}

impl MemoryAccounts {
    pub fn set_flags(&self, username: &str, enabled: Option<bool>, activated: Option<bool>) {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(acc) = accounts.iter_mut().find(|a| a.username == username) {
            acc.enabled = enabled;
            acc.activated = activated;
        }
    }

    pub fn get(&self, username: &str) -> Option<Account> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.username == username)
            .cloned()
    }

    async fn check(&self) -> Result<(), AuthError> {
        if self.hanging.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::PoolTimedOut.into());
        }
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for MemoryAccounts {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AuthError> {
        self.check().await?;
        Ok(self.get(username))
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<Account>, AuthError> {
        self.check().await?;
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.email == email)
            .cloned()
            .collect())
    }

    async fn insert(&self, account: &NewAccount) -> Result<(), AuthError> {
        self.check().await?;
        let now = chrono::Utc::now();
        self.accounts.lock().unwrap().push(Account {
            id: uuid::Uuid::new_v4(),
            username: account.username.clone(),
            email: account.email.clone(),
            registered_at: now,
            edited_at: now,
            password_hash: Some(account.password_hash.clone()),
            enabled: None,
            activated: None,
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySessions {
    pub entries: Mutex<HashMap<String, (String, Duration)>>,
    pub unavailable: AtomicBool,
    /// Every write waits forever.
    pub hanging: AtomicBool,
}

#[async_trait]
impl SessionCache for MemorySessions {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionError> {
        if self.hanging.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SessionError::InvalidTtl(ttl));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), ttl));
        Ok(())
    }
}

pub enum FakePinger {
    Healthy,
    Failing(&'static str),
    Hanging,
}

#[async_trait]
impl Pinger for FakePinger {
    async fn ping(&self) -> Result<(), ProbeError> {
        match self {
            FakePinger::Healthy => Ok(()),
            FakePinger::Failing(msg) => Err(ProbeError::Failed(msg.to_string())),
            FakePinger::Hanging => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub accounts: Arc<MemoryAccounts>,
    pub sessions: Arc<MemorySessions>,
}

pub fn config(policy: AccountPolicy) -> ApiConfig {
    ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        database_url: "postgres://localhost/gridpulse_test".into(),
        redis_url: "redis://localhost:6379/0".into(),
        jwt_secret: SECRET.into(),
        bcrypt_cost: 4,
        account_policy: policy,
    }
}

pub fn app_with(policy: AccountPolicy, postgres: FakePinger, redis: FakePinger) -> TestApp {
    let accounts = Arc::new(MemoryAccounts::default());
    let sessions = Arc::new(MemorySessions::default());
    let state = AppState::new(
        config(policy),
        accounts.clone(),
        sessions.clone(),
        LivenessProber::new(Arc::new(postgres), Arc::new(redis)),
    )
    .unwrap();
    TestApp {
        router: gridpulse_api::router(state),
        accounts,
        sessions,
    }
}

pub fn app() -> TestApp {
    app_with(AccountPolicy::Ignore, FakePinger::Healthy, FakePinger::Healthy)
}

pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let resp: Response<Body> = router.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).expect("parse JSON")
    };
    (status, json)
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_raw(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}
