use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use serde_json::{json, Value};
use shared::domain::{StudentProfile, University, UniversityId};

use crate::transport::{AdvisorTransport, AnalyticsEndpoint, TransportError};

type Script<T> = Box<dyn Fn(&StudentProfile) -> Result<T, String> + Send + Sync>;

/// In-process transport whose replies and latency depend on the profile.
pub struct ScriptedTransport {
    predict: Script<f64>,
    recommend: Script<Vec<University>>,
    delay: Box<dyn Fn(&StudentProfile) -> Duration + Send + Sync>,
    predict_delay: Duration,
    pub predict_calls: Arc<AtomicUsize>,
    pub recommend_calls: Arc<AtomicUsize>,
    pub query_calls: Arc<AtomicUsize>,
    pub analytics_calls: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            predict: Box::new(|_| Ok(50.0)),
            recommend: Box::new(|_| Ok(Vec::new())),
            delay: Box::new(|_| Duration::ZERO),
            predict_delay: Duration::ZERO,
            predict_calls: Arc::new(AtomicUsize::new(0)),
            recommend_calls: Arc::new(AtomicUsize::new(0)),
            query_calls: Arc::new(AtomicUsize::new(0)),
            analytics_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_predict(
        mut self,
        script: impl Fn(&StudentProfile) -> Result<f64, String> + Send + Sync + 'static,
    ) -> Self {
        self.predict = Box::new(script);
        self
    }

    pub fn with_recommend(
        mut self,
        script: impl Fn(&StudentProfile) -> Result<Vec<University>, String> + Send + Sync + 'static,
    ) -> Self {
        self.recommend = Box::new(script);
        self
    }

    pub fn with_delay(
        mut self,
        delay: impl Fn(&StudentProfile) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.delay = Box::new(delay);
        self
    }

    /// Extra latency for predict only, on top of `with_delay`.
    pub fn with_predict_delay(mut self, delay: Duration) -> Self {
        self.predict_delay = delay;
        self
    }

    pub fn network_calls(&self) -> usize {
        self.predict_calls.load(Ordering::SeqCst) + self.recommend_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdvisorTransport for ScriptedTransport {
    async fn predict(&self, profile: &StudentProfile) -> Result<f64, TransportError> {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep((self.delay)(profile) + self.predict_delay).await;
        (self.predict)(profile)
            .map_err(|message| TransportError::envelope("predict", Some(message)))
    }

    async fn recommend(
        &self,
        profile: &StudentProfile,
    ) -> Result<Vec<University>, TransportError> {
        self.recommend_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep((self.delay)(profile)).await;
        (self.recommend)(profile)
            .map_err(|message| TransportError::envelope("recommend", Some(message)))
    }

    async fn query(&self, question: &str) -> Result<String, TransportError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("answer to {question}"))
    }

    async fn analytics(
        &self,
        endpoint: AnalyticsEndpoint,
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let call = self.analytics_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(json!({
            "endpoint": endpoint.name(),
            "call": call,
            "body": body.cloned().unwrap_or(Value::Null),
        }))
    }
}

pub fn university(name: &str, country: &str, tuition_fee: f64) -> University {
    University {
        id: UniversityId(name.to_ascii_lowercase().replace(' ', "-")),
        name: name.to_string(),
        country: country.to_string(),
        city: "City".to_string(),
        tuition_fee,
        ranking: None,
        programs_count: None,
        top_programs: Vec::new(),
        scholarship_available: false,
        admission_chance: None,
    }
}

pub fn five_universities() -> Vec<University> {
    vec![
        university("TU Munich", "Germany", 3000.0),
        university("RWTH Aachen", "Germany", 1500.0),
        university("KIT", "Germany", 3000.0),
        university("TU Berlin", "Germany", 700.0),
        university("TU Dresden", "Germany", 800.0),
    ]
}
