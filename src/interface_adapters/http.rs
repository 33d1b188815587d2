// Shared HTTP response types for consistent API error payloads.

#[derive(Debug, Clone, serde::Serialize)]
pub struct ErrorResponse {
    // Human-readable error string for consistent JSON error responses.
    pub error: String,
}
