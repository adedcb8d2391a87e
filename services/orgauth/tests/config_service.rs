mod common;

use async_trait::async_trait;
use common::{StubResolver, memory_service, service_with};
use orgauth::model::{ConfigWriteRequest, OrgAuthConfig};
use orgauth::service::{CONFIG_KEY, ConfigError, MAX_WRITE_ATTEMPTS, ValidationError};
use orgauth::store::memory::InMemoryStore;
use orgauth::store::{ConfigStore, StoreError, StoreResult};
use orgauth_tokenutil::TokenParamsError;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn request(value: serde_json::Value) -> ConfigWriteRequest {
    serde_json::from_value(value).expect("request")
}

async fn stored_config(store: &dyn ConfigStore) -> Option<OrgAuthConfig> {
    store
        .get(CONFIG_KEY)
        .await
        .expect("get")
        .map(|bytes| serde_json::from_slice(&bytes).expect("decode"))
}

#[tokio::test]
async fn write_then_read_returns_supplied_identity() {
    let resolver = StubResolver::new(99);
    let (_store, service) = memory_service(resolver.clone());

    service
        .write(&request(json!({
            "organization": "acme",
            "organization_id": 1234,
            "base_url": "https://ghe.example.com/api/v3/",
        })))
        .await
        .expect("write");

    let view = service.read().await.expect("read").expect("present");
    assert_eq!(view.organization, "acme");
    assert_eq!(view.organization_id, 1234);
    assert_eq!(view.base_url, "https://ghe.example.com/api/v3/");
    assert_eq!(resolver.calls(), 0, "explicit id must not be looked up");
}

#[tokio::test]
async fn missing_id_is_resolved_with_injected_credential() {
    let resolver = StubResolver::new(4242);
    let store = Arc::new(InMemoryStore::new());
    let service = service_with(store.clone(), resolver.clone(), Some("ghp_operator"));

    service
        .write(&request(json!({
            "organization": "acme",
            "base_url": "https://ghe.example.com/api/v3",
        })))
        .await
        .expect("write");

    let call = resolver.last_call().expect("resolver called");
    assert_eq!(call.organization, "acme");
    assert_eq!(
        call.base_url.as_deref(),
        Some("https://ghe.example.com/api/v3/")
    );
    assert_eq!(call.token.as_deref(), Some("ghp_operator"));

    let stored = stored_config(store.as_ref()).await.expect("stored");
    assert_eq!(stored.organization_id, 4242);
    let raw = String::from_utf8(store.get(CONFIG_KEY).await.unwrap().unwrap()).unwrap();
    assert!(!raw.contains("ghp_operator"));
}

#[tokio::test]
async fn missing_organization_is_rejected_and_nothing_stored() {
    let (store, service) = memory_service(StubResolver::new(1));

    let err = service
        .write(&request(json!({ "organization_id": 5 })))
        .await
        .expect_err("missing organization");
    assert!(matches!(
        err,
        ConfigError::Validation(ValidationError::MissingOrganization)
    ));
    assert_eq!(err.to_string(), "organization is a required parameter");

    let err = service
        .write(&request(json!({ "organization": "" })))
        .await
        .expect_err("empty organization");
    assert!(matches!(err, ConfigError::Validation(_)));

    assert!(store.get(CONFIG_KEY).await.expect("get").is_none());
    assert!(service.read().await.expect("read").is_none());
}

#[tokio::test]
async fn base_url_is_normalized_with_trailing_slash() {
    let (_store, service) = memory_service(StubResolver::new(1));
    service
        .write(&request(json!({
            "organization": "acme",
            "organization_id": 1,
            "base_url": "http://example.com",
        })))
        .await
        .expect("write");
    let view = service.read().await.unwrap().unwrap();
    assert_eq!(view.base_url, "http://example.com/");
}

#[tokio::test]
async fn unparsable_base_url_is_rejected() {
    let (store, service) = memory_service(StubResolver::new(1));
    let err = service
        .write(&request(json!({
            "organization": "acme",
            "organization_id": 1,
            "base_url": "ftp://example.com",
        })))
        .await
        .expect_err("bad base_url");
    assert!(matches!(
        err,
        ConfigError::Validation(ValidationError::InvalidBaseUrl(_))
    ));
    assert!(err.to_string().starts_with("error parsing given base_url"));
    assert!(store.get(CONFIG_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn legacy_ttl_applies_until_token_ttl_is_set() {
    let (store, service) = memory_service(StubResolver::new(1));

    let outcome = service
        .write(&request(json!({
            "organization": "acme",
            "organization_id": 1,
            "ttl": 3600,
        })))
        .await
        .expect("write legacy");
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("\"ttl\" is deprecated"));

    let view = service.read().await.unwrap().unwrap();
    assert_eq!(view.ttl, Some(3600));
    assert_eq!(view.token.token_ttl, 3600);

    let stored = stored_config(store.as_ref()).await.unwrap();
    assert_eq!(stored.ttl, Duration::from_secs(3600));
    assert_eq!(stored.token.token_ttl, Duration::ZERO);

    service
        .write(&request(json!({ "token_ttl": 7200 })))
        .await
        .expect("write current");
    let view = service.read().await.unwrap().unwrap();
    assert_eq!(view.ttl, Some(7200));
    assert_eq!(view.token.token_ttl, 7200);
}

#[tokio::test]
async fn both_ttl_names_are_stored_and_current_wins() {
    let (store, service) = memory_service(StubResolver::new(1));
    service
        .write(&request(json!({
            "organization": "acme",
            "organization_id": 1,
            "max_ttl": "2h",
            "token_max_ttl": "3h",
        })))
        .await
        .expect("write");

    let stored = stored_config(store.as_ref()).await.unwrap();
    assert_eq!(stored.max_ttl, Duration::from_secs(7200));
    assert_eq!(stored.token.token_max_ttl, Duration::from_secs(10800));

    let view = service.read().await.unwrap().unwrap();
    assert_eq!(view.max_ttl, Some(10800));
    assert_eq!(view.ttl, None);
}

#[tokio::test]
async fn resolver_returning_zero_fails_and_leaves_storage_unchanged() {
    let store = Arc::new(InMemoryStore::new());
    let seeded = service_with(store.clone(), StubResolver::new(1), None);
    seeded
        .write(&request(json!({ "organization": "acme", "organization_id": 7 })))
        .await
        .expect("seed");
    let before = store.get(CONFIG_KEY).await.unwrap();

    let service = service_with(store.clone(), StubResolver::new(0), None);
    let err = service
        .write(&request(json!({ "organization": "other", "organization_id": 0 })))
        .await
        .expect_err("resolution failure");
    assert!(matches!(err, ConfigError::Resolution(_)));
    assert!(
        err.to_string()
            .contains("you must manually set it in the config")
    );
    assert_eq!(store.get(CONFIG_KEY).await.unwrap(), before);
}

#[tokio::test]
async fn first_write_without_id_fails_when_resolver_finds_nothing() {
    let (store, service) = memory_service(StubResolver::new(0));
    let err = service
        .write(&request(json!({ "organization": "acme" })))
        .await
        .expect_err("resolution failure");
    assert!(matches!(err, ConfigError::Resolution(_)));
    assert!(store.get(CONFIG_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn partial_update_preserves_unsupplied_fields() {
    let (_store, service) = memory_service(StubResolver::new(1));
    service
        .write(&request(json!({
            "organization": "acme",
            "organization_id": 10,
            "base_url": "https://ghe.example.com/",
            "token_policies": ["dev"],
        })))
        .await
        .expect("first");
    service
        .write(&request(json!({ "organization_id": 11 })))
        .await
        .expect("second");

    let view = service.read().await.unwrap().unwrap();
    assert_eq!(view.organization, "acme");
    assert_eq!(view.organization_id, 11);
    assert_eq!(view.base_url, "https://ghe.example.com/");
    assert_eq!(view.token.token_policies, vec!["dev".to_string()]);
}

#[tokio::test]
async fn empty_base_url_clears_override() {
    let (_store, service) = memory_service(StubResolver::new(1));
    service
        .write(&request(json!({
            "organization": "acme",
            "organization_id": 1,
            "base_url": "https://ghe.example.com",
        })))
        .await
        .unwrap();
    service
        .write(&request(json!({ "base_url": "" })))
        .await
        .unwrap();
    assert_eq!(service.read().await.unwrap().unwrap().base_url, "");
}

#[tokio::test]
async fn negative_organization_id_is_rejected() {
    let (_store, service) = memory_service(StubResolver::new(1));
    let err = service
        .write(&request(json!({ "organization": "acme", "organization_id": -3 })))
        .await
        .expect_err("negative id");
    assert!(matches!(
        err,
        ConfigError::Validation(ValidationError::NegativeOrganizationId)
    ));
}

#[tokio::test]
async fn token_parameter_validation_aborts_write() {
    let (store, service) = memory_service(StubResolver::new(1));
    let err = service
        .write(&request(json!({
            "organization": "acme",
            "organization_id": 1,
            "token_ttl": "2h",
            "token_max_ttl": "1h",
        })))
        .await
        .expect_err("ttl above max");
    assert!(matches!(
        err,
        ConfigError::Validation(ValidationError::TokenParams(
            TokenParamsError::TtlExceedsMaxTtl
        ))
    ));
    assert!(store.get(CONFIG_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn legacy_ttl_is_bounded_by_later_token_max_ttl() {
    let (store, service) = memory_service(StubResolver::new(1));
    service
        .write(&request(json!({
            "organization": "acme",
            "organization_id": 1,
            "ttl": 3600,
        })))
        .await
        .expect("write legacy ttl");
    let before = store.get(CONFIG_KEY).await.unwrap();

    let err = service
        .write(&request(json!({ "token_max_ttl": 1800 })))
        .await
        .expect_err("effective ttl above max");
    assert!(matches!(
        err,
        ConfigError::Validation(ValidationError::TokenParams(
            TokenParamsError::TtlExceedsMaxTtl
        ))
    ));
    assert_eq!(store.get(CONFIG_KEY).await.unwrap(), before);

    service
        .write(&request(json!({ "token_max_ttl": 3600 })))
        .await
        .expect("max equal to effective ttl");
    let view = service.read().await.unwrap().unwrap();
    assert_eq!(view.token.token_ttl, 3600);
    assert_eq!(view.token.token_max_ttl, 3600);
}

#[tokio::test]
async fn legacy_max_ttl_bounds_later_token_ttl() {
    let (store, service) = memory_service(StubResolver::new(1));
    service
        .write(&request(json!({
            "organization": "acme",
            "organization_id": 1,
            "max_ttl": 1800,
        })))
        .await
        .expect("write legacy max_ttl");

    let err = service
        .write(&request(json!({ "token_ttl": 3600 })))
        .await
        .expect_err("ttl above effective max");
    assert!(matches!(
        err,
        ConfigError::Validation(ValidationError::TokenParams(
            TokenParamsError::TtlExceedsMaxTtl
        ))
    ));
    let stored = stored_config(store.as_ref()).await.unwrap();
    assert_eq!(stored.token.token_ttl, Duration::ZERO);

    let err = service
        .write(&request(json!({ "ttl": 3600, "max_ttl": 600 })))
        .await
        .expect_err("legacy pair out of bounds");
    assert!(matches!(
        err,
        ConfigError::Validation(ValidationError::TokenParams(
            TokenParamsError::TtlExceedsMaxTtl
        ))
    ));

    service
        .write(&request(json!({ "token_ttl": 3600, "token_max_ttl": 7200 })))
        .await
        .expect("current max overrides legacy max");
    let view = service.read().await.unwrap().unwrap();
    assert_eq!(view.token.token_ttl, 3600);
    assert_eq!(view.token.token_max_ttl, 7200);
}

#[tokio::test]
async fn rename_with_kept_id_is_reported() {
    let resolver = StubResolver::new(55);
    let (_store, service) = memory_service(resolver.clone());
    service
        .write(&request(json!({ "organization": "acme", "organization_id": 9 })))
        .await
        .unwrap();

    let outcome = service
        .write(&request(json!({ "organization": "acme-renamed" })))
        .await
        .expect("rename");
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("organization_id 9 was kept"));
    assert_eq!(resolver.calls(), 0);

    let view = service.read().await.unwrap().unwrap();
    assert_eq!(view.organization, "acme-renamed");
    assert_eq!(view.organization_id, 9);

    service
        .write(&request(json!({ "organization_id": 0 })))
        .await
        .expect("re-resolve");
    assert_eq!(resolver.calls(), 1);
    assert_eq!(service.read().await.unwrap().unwrap().organization_id, 55);
}

/// Store that lets another writer slip in before each of the first `races`
/// conditional writes.
struct RacingStore {
    inner: InMemoryStore,
    races: AtomicUsize,
    bumps: AtomicUsize,
}

impl RacingStore {
    fn new(races: usize) -> Self {
        Self {
            inner: InMemoryStore::new(),
            races: AtomicUsize::new(races),
            bumps: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ConfigStore for RacingStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        self.inner.put(key, value).await
    }

    async fn compare_and_put(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: Vec<u8>,
    ) -> StoreResult<()> {
        if self.races.load(Ordering::SeqCst) > 0 {
            self.races.fetch_sub(1, Ordering::SeqCst);
            let bump = self.bumps.fetch_add(1, Ordering::SeqCst) as i64 + 1;
            let other = json!({ "organization": "acme", "organization_id": 100 + bump });
            self.inner
                .put(key, serde_json::to_vec(&other).expect("encode"))
                .await?;
        }
        self.inner.compare_and_put(key, expected, value).await
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "racing"
    }
}

#[tokio::test]
async fn lost_race_is_retried_with_fresh_state() {
    let store = Arc::new(RacingStore::new(1));
    let service = service_with(store.clone(), StubResolver::new(1), None);

    service
        .write(&request(json!({ "organization": "acme", "token_num_uses": 4 })))
        .await
        .expect("write after one retry");

    let stored = stored_config(store.as_ref()).await.unwrap();
    assert_eq!(stored.organization_id, 101, "merged on top of the racing write");
    assert_eq!(stored.token.token_num_uses, 4);
}

#[tokio::test]
async fn persistent_races_surface_a_conflict() {
    let store = Arc::new(RacingStore::new(MAX_WRITE_ATTEMPTS));
    let service = service_with(store.clone(), StubResolver::new(1), None);

    let err = service
        .write(&request(json!({ "organization": "acme", "organization_id": 1 })))
        .await
        .expect_err("conflict");
    assert!(matches!(err, ConfigError::Storage(StoreError::Conflict(_))));

    let stored = stored_config(store.as_ref()).await.unwrap();
    assert_eq!(stored.organization_id, 100 + MAX_WRITE_ATTEMPTS as i64);
}
