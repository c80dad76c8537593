use shared::error::RequestFailure;
use tracing::warn;

use crate::transport::AdvisorTransport;

/// Sends a free-text question. A blank question issues no request and
/// yields `Ok(None)`.
pub async fn ask(
    transport: &dyn AdvisorTransport,
    question: &str,
) -> Result<Option<String>, RequestFailure> {
    let question = question.trim();
    if question.is_empty() {
        return Ok(None);
    }
    match transport.query(question).await {
        Ok(answer) => Ok(Some(answer)),
        Err(err) => {
            warn!(error = %err, "advisor: query failed");
            Err(RequestFailure::network(err.to_string()))
        }
    }
}
