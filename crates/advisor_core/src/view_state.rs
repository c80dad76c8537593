//! Observable state for the profile → recommendations flow.
//!
//! [`transition`] is the whole state machine; [`ViewStateController`] only
//! feeds it events and owns the collaborators that produce them.

use serde_json::Value;
use shared::{
    domain::{FilterCriteria, RawProfileInput, University},
    error::{ErrorKind, RequestFailure, ValidationError},
};
use tracing::{debug, info};

use crate::{
    analytics::AnalyticsClient,
    filter,
    sequencer::{RequestOutcome, RequestSequencer, ResolvedSubmission, SequenceToken, Submission},
    validator::validate,
};

pub const NO_MATCHES_MESSAGE: &str = "No matches — adjust filters or budget.";
pub const RETRY_MESSAGE: &str =
    "We couldn't reach the advisor service. Please check your connection and try again.";

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub outcome: RequestOutcome,
    /// Highest token seen; events carrying any other token are stale.
    pub latest_token: Option<SequenceToken>,
    pub visible_list: Vec<University>,
    /// Set when the service returned zero candidates.
    pub empty_result: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            outcome: RequestOutcome::Idle,
            latest_token: None,
            visible_list: Vec::new(),
            empty_result: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Error { message: String, retryable: bool },
    NoMatches,
}

impl Banner {
    pub fn message(&self) -> &str {
        match self {
            Self::Error { message, .. } => message,
            Self::NoMatches => NO_MATCHES_MESSAGE,
        }
    }
}

impl ViewState {
    pub fn admission_chance(&self) -> Option<f64> {
        match &self.outcome {
            RequestOutcome::Success {
                admission_chance, ..
            } => *admission_chance,
            _ => None,
        }
    }

    pub fn recommendations(&self) -> &[University] {
        match &self.outcome {
            RequestOutcome::Success {
                recommendations, ..
            } => recommendations,
            _ => &[],
        }
    }

    /// What the presentation layer shows above the list, if anything.
    pub fn banner(&self) -> Option<Banner> {
        match &self.outcome {
            RequestOutcome::Failed(failure) => Some(match &failure.kind {
                ErrorKind::Validation(_) => Banner::Error {
                    message: failure.message.clone(),
                    retryable: false,
                },
                ErrorKind::Network | ErrorKind::Timeout => Banner::Error {
                    message: RETRY_MESSAGE.to_string(),
                    retryable: true,
                },
            }),
            RequestOutcome::Success { .. } if self.visible_list.is_empty() => {
                Some(Banner::NoMatches)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Submitted { token: SequenceToken },
    ValidationPassed { token: SequenceToken },
    ValidationFailed {
        token: SequenceToken,
        error: ValidationError,
    },
    Resolved {
        token: SequenceToken,
        outcome: RequestOutcome,
    },
    CriteriaChanged,
}

pub fn transition(state: ViewState, event: ViewEvent, criteria: &FilterCriteria) -> ViewState {
    match event {
        ViewEvent::Submitted { token } => {
            if state.latest_token.is_some_and(|latest| token <= latest) {
                debug!(token = token.0, "view: ignoring out-of-order submission");
                return state;
            }
            ViewState {
                outcome: RequestOutcome::Validating,
                latest_token: Some(token),
                visible_list: Vec::new(),
                empty_result: false,
            }
        }
        ViewEvent::ValidationPassed { token } => {
            if !is_current(&state, token) || state.outcome != RequestOutcome::Validating {
                return state;
            }
            ViewState {
                outcome: RequestOutcome::Submitting,
                ..state
            }
        }
        ViewEvent::ValidationFailed { token, error } => {
            if !is_current(&state, token) || state.outcome != RequestOutcome::Validating {
                return state;
            }
            ViewState {
                outcome: RequestOutcome::Failed(RequestFailure::from(error)),
                visible_list: Vec::new(),
                empty_result: false,
                ..state
            }
        }
        ViewEvent::Resolved { token, outcome } => {
            if !is_current(&state, token) {
                debug!(
                    token = token.0,
                    latest = ?state.latest_token,
                    "view: dropping stale response"
                );
                return state;
            }
            if state.outcome != RequestOutcome::Submitting {
                return state;
            }
            match outcome {
                RequestOutcome::Success {
                    admission_chance,
                    recommendations,
                } => ViewState {
                    visible_list: filter::apply(&recommendations, criteria),
                    empty_result: recommendations.is_empty(),
                    outcome: RequestOutcome::Success {
                        admission_chance,
                        recommendations,
                    },
                    ..state
                },
                RequestOutcome::Failed(failure) => ViewState {
                    outcome: RequestOutcome::Failed(failure),
                    visible_list: Vec::new(),
                    empty_result: false,
                    ..state
                },
                RequestOutcome::Idle | RequestOutcome::Validating | RequestOutcome::Submitting => {
                    state
                }
            }
        }
        ViewEvent::CriteriaChanged => {
            let visible_list = match &state.outcome {
                RequestOutcome::Success {
                    recommendations, ..
                } => filter::apply(recommendations, criteria),
                _ => return state,
            };
            ViewState {
                visible_list,
                ..state
            }
        }
    }
}

fn is_current(state: &ViewState, token: SequenceToken) -> bool {
    state.latest_token == Some(token)
}

/// Long-lived controller behind one results view. Cycles on every submission.
pub struct ViewStateController {
    sequencer: RequestSequencer,
    analytics: AnalyticsClient,
    criteria: FilterCriteria,
    state: ViewState,
}

impl ViewStateController {
    pub fn new(sequencer: RequestSequencer, analytics: AnalyticsClient) -> Self {
        Self {
            sequencer,
            analytics,
            criteria: FilterCriteria::default(),
            state: ViewState::default(),
        }
    }

    pub fn with_criteria(mut self, criteria: FilterCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn snapshot(&self) -> ViewState {
        self.state.clone()
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn sequencer(&self) -> &RequestSequencer {
        &self.sequencer
    }

    pub fn analytics(&self) -> &AnalyticsClient {
        &self.analytics
    }

    fn dispatch_event(&mut self, event: ViewEvent) {
        let state = std::mem::take(&mut self.state);
        self.state = transition(state, event, &self.criteria);
    }

    /// Restarts the machine for `raw`. Returns the in-flight submission when
    /// validation passes; its result goes back through [`Self::complete`].
    pub fn begin_submission(&mut self, raw: &RawProfileInput) -> Option<Submission> {
        let token = self.sequencer.next_token();
        self.dispatch_event(ViewEvent::Submitted { token });

        match validate(raw) {
            Ok(profile) => {
                self.dispatch_event(ViewEvent::ValidationPassed { token });
                Some(self.sequencer.dispatch(token, profile))
            }
            Err(error) => {
                info!(token = token.0, error = %error, "view: profile rejected");
                self.dispatch_event(ViewEvent::ValidationFailed { token, error });
                None
            }
        }
    }

    /// Applies a resolved submission. Returns `false` when it was stale and
    /// therefore dropped.
    pub fn complete(&mut self, resolved: ResolvedSubmission) -> bool {
        let applied = is_current(&self.state, resolved.token)
            && self.state.outcome == RequestOutcome::Submitting;
        self.dispatch_event(ViewEvent::Resolved {
            token: resolved.token,
            outcome: resolved.outcome,
        });
        applied
    }

    pub async fn submit(&mut self, raw: &RawProfileInput) -> &ViewState {
        if let Some(submission) = self.begin_submission(raw) {
            let resolved = submission.resolve().await;
            self.complete(resolved);
        }
        &self.state
    }

    /// Recomputes the visible list synchronously; never touches the network.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) -> &[University] {
        self.criteria = criteria;
        self.dispatch_event(ViewEvent::CriteriaChanged);
        &self.state.visible_list
    }

    /// Analytics summary of the current recommendations, if there are any.
    pub async fn analytics_summary(&self) -> Result<Option<Value>, RequestFailure> {
        let recommendations = self.state.recommendations();
        if recommendations.is_empty() {
            return Ok(None);
        }
        self.analytics
            .summary(recommendations)
            .await
            .map(Some)
            .map_err(|err| RequestFailure::network(err.to_string()))
    }
}

#[cfg(test)]
#[path = "tests/view_state_tests.rs"]
mod tests;
