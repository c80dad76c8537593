//! Remote calls to the advisor service.
//!
//! [`AdvisorTransport`] is the seam the sequencer, the analytics client and
//! the Q&A flow talk to. [`HttpTransport`] speaks the JSON-over-HTTP contract;
//! tests substitute scripted implementations.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::{
    domain::{StudentProfile, University},
    protocol::{PredictResponse, QueryRequest, QueryResponse, RecommendResponse, ResponseStatus},
};
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },
    #[error("{endpoint} reported an error: {message}")]
    Envelope { endpoint: String, message: String },
    #[error("{endpoint} returned an unreadable body: {reason}")]
    Decode { endpoint: String, reason: String },
    #[error("advisor transport is unavailable")]
    Unavailable,
}

impl TransportError {
    pub fn envelope(endpoint: &str, message: Option<String>) -> Self {
        Self::Envelope {
            endpoint: endpoint.to_string(),
            message: message.unwrap_or_else(|| "unknown error".to_string()),
        }
    }

    fn decode(endpoint: &str, reason: impl Into<String>) -> Self {
        Self::Decode {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalyticsEndpoint {
    Summary,
    Recommendations,
    Compare,
    Performance,
}

impl AnalyticsEndpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::Summary => "api/v2/analytics/summary",
            Self::Recommendations => "api/v2/analytics/recommendations",
            Self::Compare => "api/v2/analytics/compare",
            Self::Performance => "api/v2/analytics/performance",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Recommendations => "recommendations",
            Self::Compare => "compare",
            Self::Performance => "performance",
        }
    }

    fn method(self) -> Method {
        match self {
            Self::Performance => Method::GET,
            _ => Method::POST,
        }
    }
}

#[async_trait]
pub trait AdvisorTransport: Send + Sync {
    /// Admission chance in percent.
    async fn predict(&self, profile: &StudentProfile) -> Result<f64, TransportError>;
    async fn recommend(&self, profile: &StudentProfile)
        -> Result<Vec<University>, TransportError>;
    async fn query(&self, question: &str) -> Result<String, TransportError>;
    async fn analytics(
        &self,
        endpoint: AnalyticsEndpoint,
        body: Option<&Value>,
    ) -> Result<Value, TransportError>;
}

pub struct MissingTransport;

#[async_trait]
impl AdvisorTransport for MissingTransport {
    async fn predict(&self, _profile: &StudentProfile) -> Result<f64, TransportError> {
        Err(TransportError::Unavailable)
    }

    async fn recommend(
        &self,
        _profile: &StudentProfile,
    ) -> Result<Vec<University>, TransportError> {
        Err(TransportError::Unavailable)
    }

    async fn query(&self, _question: &str) -> Result<String, TransportError> {
        Err(TransportError::Unavailable)
    }

    async fn analytics(
        &self,
        _endpoint: AnalyticsEndpoint,
        _body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        Err(TransportError::Unavailable)
    }
}

pub struct HttpTransport {
    http: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url =
            Url::parse(&base).with_context(|| format!("invalid advisor api url '{base_url}'"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            anyhow::bail!("advisor api url must start with http:// or https://");
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build http client")?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn send_json<B, R>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<R, TransportError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self
            .base_url
            .join(path)
            .map_err(|err| TransportError::decode(path, format!("bad endpoint url: {err}")))?;
        let mut request = self.http.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }
        debug!(endpoint = path, method = %method, "advisor: sending request");

        let res = request.send().await.map_err(|source| TransportError::Http {
            endpoint: path.to_string(),
            source,
        })?;
        let status = res.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }
        res.json::<R>()
            .await
            .map_err(|err| TransportError::decode(path, err.to_string()))
    }
}

#[async_trait]
impl AdvisorTransport for HttpTransport {
    async fn predict(&self, profile: &StudentProfile) -> Result<f64, TransportError> {
        const ENDPOINT: &str = "predict";
        let body: PredictResponse = self.send_json(Method::POST, ENDPOINT, Some(profile)).await?;
        if body.status == ResponseStatus::Error {
            return Err(TransportError::envelope(ENDPOINT, body.message));
        }
        body.admission_chance
            .as_ref()
            .and_then(|chance| chance.as_percent())
            .ok_or_else(|| {
                TransportError::decode(ENDPOINT, "missing or non-numeric admission_chance")
            })
    }

    async fn recommend(
        &self,
        profile: &StudentProfile,
    ) -> Result<Vec<University>, TransportError> {
        const ENDPOINT: &str = "recommend";
        let body: RecommendResponse =
            self.send_json(Method::POST, ENDPOINT, Some(profile)).await?;
        if body.status == ResponseStatus::Error {
            return Err(TransportError::envelope(ENDPOINT, body.message));
        }
        Ok(body
            .recommendations
            .into_iter()
            .map(University::from)
            .collect())
    }

    async fn query(&self, question: &str) -> Result<String, TransportError> {
        const ENDPOINT: &str = "query";
        let request = QueryRequest {
            query: question.to_string(),
        };
        let body: QueryResponse = self
            .send_json(Method::POST, ENDPOINT, Some(&request))
            .await?;
        if body.status == ResponseStatus::Error {
            return Err(TransportError::envelope(ENDPOINT, body.message));
        }
        body.answer
            .ok_or_else(|| TransportError::decode(ENDPOINT, "missing answer"))
    }

    async fn analytics(
        &self,
        endpoint: AnalyticsEndpoint,
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        self.send_json(endpoint.method(), endpoint.path(), body)
            .await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
