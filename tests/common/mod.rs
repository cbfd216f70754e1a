use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use laytime_api::auth::IdentityResolver;
use laytime_api::middleware::AuthUser;
use laytime_api::models::{CharterParty, NewCharterParty};
use laytime_api::store::{CharterPartyStore, StoreError};
use laytime_api::{app, AppState};

/// In-memory store double. Counts every access so tests can prove the
/// handlers never touch persistence on an unauthenticated request, and can
/// be switched into a failing mode to exercise the 500 paths.
pub struct MemoryStore {
    records: Mutex<Vec<CharterParty>>,
    accesses: AtomicUsize,
    seq: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            accesses: AtomicUsize::new(0),
            seq: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    pub fn access_count(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn fail_requests(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn touch(&self) -> Result<(), StoreError> {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::QueryError("injected store fault".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CharterPartyStore for MemoryStore {
    async fn list_for_voyage(&self, voyage_id: &str) -> Result<Vec<CharterParty>, StoreError> {
        self.touch()?;

        let mut matching: Vec<CharterParty> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.voyage_id == voyage_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn create(&self, record: NewCharterParty) -> Result<CharterParty, StoreError> {
        self.touch()?;

        // Strictly increasing timestamps keep list ordering deterministic
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) as i64;
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(seq);

        let stored = CharterParty {
            id: Uuid::new_v4().to_string(),
            voyage_id: record.voyage_id,
            cp_number: record.cp_number,
            cp_date: record.cp_date,
            laycan_start: record.laycan_start,
            laycan_end: record.laycan_end,
            laytime_allowed: record.laytime_allowed,
            laytime_unit: record.laytime_unit,
            terms: record.terms,
            demurrage_rate: record.demurrage_rate,
            despatch_rate: record.despatch_rate,
            despatch_percentage: record.despatch_percentage,
            reversible: record.reversible,
            pro_ratable: record.pro_ratable,
            shinc: record.shinc,
            shex: record.shex,
            notes: record.notes,
            created_at,
        };

        self.records.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn delete(&self, charter_party_id: &str) -> Result<(), StoreError> {
        self.touch()?;

        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.id != charter_party_id);

        if records.len() == before {
            return Err(StoreError::NotFound(charter_party_id.to_string()));
        }
        Ok(())
    }
}

/// Identity double that resolves every request to the same caller (or none)
pub struct StaticIdentity(pub Option<AuthUser>);

#[async_trait]
impl IdentityResolver for StaticIdentity {
    async fn resolve(&self, _headers: &HeaderMap) -> Option<AuthUser> {
        self.0.clone()
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

fn build(identity: StaticIdentity) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let state = AppState {
        store: store.clone(),
        identity: Arc::new(identity),
    };
    TestApp {
        router: app(state),
        store,
    }
}

pub fn authenticated_app() -> TestApp {
    build(StaticIdentity(Some(AuthUser {
        user_id: Uuid::new_v4(),
        email: Some("ops@laytime.example".to_string()),
    })))
}

pub fn unauthenticated_app() -> TestApp {
    build(StaticIdentity(None))
}

pub fn charter_parties_uri(voyage_id: &str) -> String {
    format!("/api/voyages/{}/charter-parties", voyage_id)
}

/// Drive the router in-process and return (status, parsed JSON body)
pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> anyhow::Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);

    let request = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            builder.body(Body::from(serde_json::to_vec(&json)?))?
        }
        None => builder.body(Body::empty())?,
    };

    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();

    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok((status, json))
}
