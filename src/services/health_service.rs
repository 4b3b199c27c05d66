use tracing::warn;

use crate::dto::health::HealthResponse;
use crate::state::SharedState;

/// Respond with the service health, degraded when no quizzes can be served.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    if state.quiz().fetch_all_titles().await.is_empty() {
        warn!("song library is empty (degraded mode)");
        return HealthResponse::degraded();
    }
    HealthResponse::ok()
}
