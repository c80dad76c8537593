use std::sync::Arc;

use serde_json::Value;
use sha2::{Digest, Sha256};
use shared::{
    domain::University,
    protocol::{RecommendationQualityRequest, UniversitiesRequest},
};
use tracing::debug;

use crate::{
    cache::ResultCache,
    transport::{AdvisorTransport, AnalyticsEndpoint, TransportError},
};

pub const ANALYTICS_NAMESPACE: &str = "analytics_";
pub const DEFAULT_MAX_AGE_MILLIS: i64 = 300_000;

/// Analytics calls answered from [`ResultCache`] when a fresh result for the
/// same request body exists.
pub struct AnalyticsClient {
    transport: Arc<dyn AdvisorTransport>,
    cache: ResultCache<Value>,
    max_age_millis: i64,
}

impl AnalyticsClient {
    pub fn new(transport: Arc<dyn AdvisorTransport>, cache: ResultCache<Value>) -> Self {
        Self {
            transport,
            cache,
            max_age_millis: DEFAULT_MAX_AGE_MILLIS,
        }
    }

    pub fn with_max_age(mut self, max_age_millis: i64) -> Self {
        self.max_age_millis = max_age_millis;
        self
    }

    pub fn cache(&self) -> &ResultCache<Value> {
        &self.cache
    }

    pub async fn summary(&self, universities: &[University]) -> Result<Value, TransportError> {
        let body = to_body(&UniversitiesRequest { universities })?;
        self.fetch(AnalyticsEndpoint::Summary, Some(body)).await
    }

    pub async fn recommendation_quality(
        &self,
        recommendations: &[University],
    ) -> Result<Value, TransportError> {
        let body = to_body(&RecommendationQualityRequest { recommendations })?;
        self.fetch(AnalyticsEndpoint::Recommendations, Some(body))
            .await
    }

    pub async fn compare(&self, universities: &[University]) -> Result<Value, TransportError> {
        let body = to_body(&UniversitiesRequest { universities })?;
        self.fetch(AnalyticsEndpoint::Compare, Some(body)).await
    }

    pub async fn performance(&self) -> Result<Value, TransportError> {
        self.fetch(AnalyticsEndpoint::Performance, None).await
    }

    /// Drops cached results of one endpoint, or all of them.
    pub fn clear(&self, endpoint: Option<AnalyticsEndpoint>) {
        match endpoint {
            Some(endpoint) => self.cache.clear(&format!("{}:", endpoint.name())),
            None => self.cache.clear(""),
        }
    }

    async fn fetch(
        &self,
        endpoint: AnalyticsEndpoint,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        let key = request_key(endpoint, body.as_ref());
        if let Some(hit) = self.cache.get(&key, self.max_age_millis) {
            debug!(endpoint = endpoint.name(), key = %key, "analytics: cache hit");
            return Ok(hit);
        }

        let value = self.transport.analytics(endpoint, body.as_ref()).await?;
        self.cache.store(&key, &value);
        Ok(value)
    }
}

fn to_body<B: serde::Serialize>(body: &B) -> Result<Value, TransportError> {
    serde_json::to_value(body).map_err(|err| TransportError::Decode {
        endpoint: "analytics".to_string(),
        reason: err.to_string(),
    })
}

/// `<endpoint>:<sha256 of the request body>`; identical requests share a key.
pub fn request_key(endpoint: AnalyticsEndpoint, body: Option<&Value>) -> String {
    let mut hasher = Sha256::new();
    if let Some(body) = body {
        hasher.update(body.to_string().as_bytes());
    }
    format!("{}:{}", endpoint.name(), hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::{
        cache::ManualClock,
        store::MemoryStore,
        test_support::{five_universities, ScriptedTransport},
    };

    fn client() -> (AnalyticsClient, Arc<ManualClock>, Arc<std::sync::atomic::AtomicUsize>) {
        let transport = ScriptedTransport::new();
        let calls = Arc::clone(&transport.analytics_calls);
        let clock = Arc::new(ManualClock::new(0));
        let cache = ResultCache::new(
            Arc::new(MemoryStore::new()),
            clock.clone(),
            ANALYTICS_NAMESPACE,
        );
        (
            AnalyticsClient::new(Arc::new(transport), cache),
            clock,
            calls,
        )
    }

    #[tokio::test]
    async fn repeat_requests_are_served_from_cache() {
        let (client, _clock, calls) = client();
        let universities = five_universities();

        let first = client.summary(&universities).await.expect("summary");
        let second = client.summary(&universities).await.expect("summary");

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_bodies_use_different_keys() {
        let (client, _clock, calls) = client();
        let universities = five_universities();

        client.summary(&universities).await.expect("summary");
        client.summary(&universities[..2]).await.expect("summary");
        client.compare(&universities).await.expect("compare");

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stale_results_are_refetched() {
        let (client, clock, calls) = client();

        client.performance().await.expect("performance");
        clock.advance(DEFAULT_MAX_AGE_MILLIS + 1);
        let refreshed = client.performance().await.expect("performance");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(refreshed["call"], 2);
    }

    #[tokio::test]
    async fn clearing_one_endpoint_keeps_others() {
        let (client, _clock, calls) = client();
        let universities = five_universities();

        client.summary(&universities).await.expect("summary");
        client.recommendation_quality(&universities).await.expect("quality");
        client.clear(Some(AnalyticsEndpoint::Summary));
        client.summary(&universities).await.expect("summary");
        client.recommendation_quality(&universities).await.expect("quality");

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn request_key_is_stable() {
        let body = serde_json::json!({ "universities": [] });
        let key = request_key(AnalyticsEndpoint::Summary, Some(&body));
        assert_eq!(key, request_key(AnalyticsEndpoint::Summary, Some(&body)));
        assert!(key.starts_with("summary:"));
        assert_eq!(key.len(), "summary:".len() + 64);
    }
}
