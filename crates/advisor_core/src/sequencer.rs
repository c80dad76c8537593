use std::{
    fmt,
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use futures::{future::BoxFuture, FutureExt};
use shared::{
    domain::{StudentProfile, University},
    error::RequestFailure,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::transport::{AdvisorTransport, TransportError};

/// Strictly increasing identity of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceToken(pub u64);

impl fmt::Display for SequenceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    Idle,
    Validating,
    Submitting,
    Success {
        /// `None` when the predict call failed but recommendations arrived.
        admission_chance: Option<f64>,
        recommendations: Vec<University>,
    },
    Failed(RequestFailure),
}

impl RequestOutcome {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Validating | Self::Submitting)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SequencerOptions {
    /// Upper bound for both remote calls together.
    pub timeout: Option<Duration>,
}

pub struct RequestSequencer {
    transport: Arc<dyn AdvisorTransport>,
    options: SequencerOptions,
    last_token: AtomicU64,
}

/// A dispatched submission. Dropping it abandons the result; the calls
/// themselves are not cancelled.
pub struct Submission {
    pub token: SequenceToken,
    outcome: BoxFuture<'static, RequestOutcome>,
}

impl Submission {
    pub async fn resolve(self) -> ResolvedSubmission {
        ResolvedSubmission {
            token: self.token,
            outcome: self.outcome.await,
        }
    }
}

impl fmt::Debug for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submission")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSubmission {
    pub token: SequenceToken,
    pub outcome: RequestOutcome,
}

impl RequestSequencer {
    pub fn new(transport: Arc<dyn AdvisorTransport>, options: SequencerOptions) -> Self {
        Self {
            transport,
            options,
            last_token: AtomicU64::new(0),
        }
    }

    pub fn transport(&self) -> Arc<dyn AdvisorTransport> {
        Arc::clone(&self.transport)
    }

    pub fn next_token(&self) -> SequenceToken {
        SequenceToken(self.last_token.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn latest_token(&self) -> Option<SequenceToken> {
        match self.last_token.load(Ordering::SeqCst) {
            0 => None,
            token => Some(SequenceToken(token)),
        }
    }

    pub fn submit(&self, profile: StudentProfile) -> Submission {
        let token = self.next_token();
        self.dispatch(token, profile)
    }

    /// Starts both remote calls for `profile` under an already issued token.
    /// The timeout bounds each call on its own.
    pub fn dispatch(&self, token: SequenceToken, profile: StudentProfile) -> Submission {
        info!(token = token.0, "advisor: dispatching predict and recommend");
        let transport = Arc::clone(&self.transport);
        let timeout = self.options.timeout;
        let outcome = run_calls(transport, profile, token, timeout).boxed();

        Submission { token, outcome }
    }
}

#[derive(Debug, Error)]
enum CallError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("no response within {} ms", .0.as_millis())]
    TimedOut(Duration),
}

async fn bounded<T>(
    limit: Option<Duration>,
    call: impl Future<Output = Result<T, TransportError>>,
) -> Result<T, CallError> {
    match limit {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result.map_err(CallError::from),
            Err(_) => Err(CallError::TimedOut(limit)),
        },
        None => call.await.map_err(CallError::from),
    }
}

async fn run_calls(
    transport: Arc<dyn AdvisorTransport>,
    profile: StudentProfile,
    token: SequenceToken,
    timeout: Option<Duration>,
) -> RequestOutcome {
    let (predicted, recommended) = futures::join!(
        bounded(timeout, transport.predict(&profile)),
        bounded(timeout, transport.recommend(&profile)),
    );
    combine(token, predicted, recommended)
}

fn combine(
    token: SequenceToken,
    predicted: Result<f64, CallError>,
    recommended: Result<Vec<University>, CallError>,
) -> RequestOutcome {
    let recommend_err = match (predicted, recommended) {
        (predicted, Ok(recommendations)) => {
            let admission_chance = match predicted {
                Ok(chance) => Some(chance.clamp(0.0, 100.0)),
                Err(err) => {
                    warn!(
                        token = token.0,
                        error = %err,
                        "advisor: predict failed, keeping recommendations"
                    );
                    None
                }
            };
            info!(
                token = token.0,
                count = recommendations.len(),
                "advisor: submission resolved"
            );
            return RequestOutcome::Success {
                admission_chance,
                recommendations,
            };
        }
        (Ok(_), Err(err)) => {
            warn!(token = token.0, error = %err, "advisor: recommend failed");
            err
        }
        (Err(predict_err), Err(recommend_err)) => {
            warn!(
                token = token.0,
                predict_error = %predict_err,
                recommend_error = %recommend_err,
                "advisor: both calls failed"
            );
            recommend_err
        }
    };

    match recommend_err {
        CallError::TimedOut(limit) => RequestOutcome::Failed(RequestFailure::timeout(format!(
            "no response from the advisor service within {} ms",
            limit.as_millis()
        ))),
        CallError::Transport(err) => RequestOutcome::Failed(RequestFailure::network(format!(
            "recommendations unavailable: {err}"
        ))),
    }
}

#[cfg(test)]
#[path = "tests/sequencer_tests.rs"]
mod tests;
