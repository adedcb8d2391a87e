#![allow(dead_code)]

use async_trait::async_trait;
use orgauth::auth::credentials::StaticCredentialSource;
use orgauth::auth::resolver::{OrganizationResolver, ResolutionError};
use orgauth::service::ConfigService;
use orgauth::store::ConfigStore;
use orgauth::store::memory::InMemoryStore;
use reqwest::Url;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveCall {
    pub organization: String,
    pub base_url: Option<String>,
    pub token: Option<String>,
}

/// Resolver that answers with a fixed ID; `0` yields a not-found error.
pub struct StubResolver {
    id: i64,
    calls: AtomicUsize,
    last: Mutex<Option<ResolveCall>>,
}

impl StubResolver {
    pub fn new(id: i64) -> Arc<Self> {
        Arc::new(Self {
            id,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_call(&self) -> Option<ResolveCall> {
        self.last.lock().expect("lock").clone()
    }
}

#[async_trait]
impl OrganizationResolver for StubResolver {
    async fn resolve(
        &self,
        organization: &str,
        base_url: Option<&Url>,
        token: Option<&str>,
    ) -> Result<i64, ResolutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().expect("lock") = Some(ResolveCall {
            organization: organization.to_string(),
            base_url: base_url.map(|url| url.to_string()),
            token: token.map(str::to_string),
        });
        if self.id == 0 {
            return Err(ResolutionError::NotFound {
                organization: organization.to_string(),
            });
        }
        Ok(self.id)
    }
}

pub fn service_with(
    store: Arc<dyn ConfigStore>,
    resolver: Arc<StubResolver>,
    token: Option<&str>,
) -> ConfigService {
    ConfigService::new(
        store,
        resolver,
        Arc::new(StaticCredentialSource::new(token.map(str::to_string))),
    )
}

pub fn memory_service(resolver: Arc<StubResolver>) -> (Arc<InMemoryStore>, ConfigService) {
    let store = Arc::new(InMemoryStore::new());
    let service = service_with(store.clone(), resolver, None);
    (store, service)
}
