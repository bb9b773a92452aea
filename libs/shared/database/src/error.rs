use thiserror::Error;

use shared_models::error::AppError;

/// Postgres unique_violation, surfaced by PostgREST in the error body.
pub const UNIQUE_VIOLATION: &str = "23505";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Authentication error: {0}")]
    Unauthorized(String),

    #[error("Backend unavailable: {0}")]
    Transient(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl DatabaseError {
    /// Maps an unsuccessful PostgREST response onto the error taxonomy.
    pub fn from_status(status: u16, body: &str) -> Self {
        let code = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("code").and_then(|c| c.as_str()).map(str::to_string));

        if status == 409 || code.as_deref() == Some(UNIQUE_VIOLATION) {
            return DatabaseError::Conflict(body.to_string());
        }

        match status {
            401 | 403 => DatabaseError::Unauthorized(body.to_string()),
            404 => DatabaseError::NotFound(body.to_string()),
            408 | 429 | 500..=599 => DatabaseError::Transient(format!("HTTP {}: {}", status, body)),
            _ => DatabaseError::Rejected(format!("HTTP {}: {}", status, body)),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, DatabaseError::Transient(_))
    }
}

impl From<reqwest::Error> for DatabaseError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DatabaseError::Decode(err.to_string())
        } else {
            DatabaseError::Transient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DatabaseError {
    fn from(err: serde_json::Error) -> Self {
        DatabaseError::Decode(err.to_string())
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Conflict(msg) => AppError::conflict(msg),
            DatabaseError::NotFound(msg) => AppError::NotFound(msg),
            DatabaseError::Transient(msg) => AppError::Unavailable(msg),
            DatabaseError::Unauthorized(msg) => AppError::ExternalService(msg),
            DatabaseError::Rejected(msg) | DatabaseError::Decode(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn unique_violation_maps_to_conflict() {
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint"}"#;
        assert_matches!(DatabaseError::from_status(409, body), DatabaseError::Conflict(_));
        assert_matches!(DatabaseError::from_status(400, body), DatabaseError::Conflict(_));
    }

    #[test]
    fn server_errors_are_transient() {
        assert!(DatabaseError::from_status(503, "upstream down").is_transient());
        assert!(!DatabaseError::from_status(400, "bad filter").is_transient());
        assert_matches!(DatabaseError::from_status(404, ""), DatabaseError::NotFound(_));
    }
}
