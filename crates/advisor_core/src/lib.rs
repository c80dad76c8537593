//! Client-side orchestration for the university advisor: profile validation,
//! the predict/recommend submission flow, local filtering of the results and
//! a TTL cache in front of the analytics endpoints.

pub mod analytics;
pub mod assistant;
pub mod cache;
pub mod filter;
pub mod sequencer;
pub mod store;
pub mod transport;
pub mod validator;
pub mod view_state;

pub use analytics::{AnalyticsClient, ANALYTICS_NAMESPACE, DEFAULT_MAX_AGE_MILLIS};
pub use cache::{CacheEntry, Clock, ManualClock, ResultCache, SystemClock};
pub use sequencer::{
    RequestOutcome, RequestSequencer, ResolvedSubmission, SequenceToken, SequencerOptions,
    Submission,
};
pub use store::{CacheError, JsonFileStore, KeyValueStore, MemoryStore};
pub use transport::{
    AdvisorTransport, AnalyticsEndpoint, HttpTransport, MissingTransport, TransportError,
};
pub use view_state::{transition, Banner, ViewEvent, ViewState, ViewStateController};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
