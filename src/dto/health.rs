use serde::Serialize;

/// Payload returned by the health check endpoint.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the song library is empty.
    pub status: &'static str,
}

impl HealthResponse {
    /// Healthy response.
    pub fn ok() -> Self {
        Self { status: "ok" }
    }

    /// Degraded response: the server runs but cannot supply quizzes.
    pub fn degraded() -> Self {
        Self { status: "degraded" }
    }
}
