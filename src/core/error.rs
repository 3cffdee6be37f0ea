//! Error taxonomy shared by the store, the analytics engine and the CLI
//!
//! Every failure is classified as a bad request, a missing entity, or an
//! internal error. At the outer boundary all of them collapse to the same
//! `{"error": "<message>"}` body.

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::core::identity::{EntityId, EntityPrefix, IdParseError};
use crate::core::project::WorkspaceError;

pub type Result<T, E = ShgError> = std::result::Result<T, E>;

#[derive(Debug, Error, Diagnostic)]
pub enum ShgError {
    #[error("{0}")]
    #[diagnostic(code(shg::validation))]
    Validation(String),

    #[error("{0}")]
    #[diagnostic(code(shg::not_found))]
    NotFound(String),

    #[error("database error: {0}")]
    #[diagnostic(code(shg::database))]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    #[diagnostic(code(shg::io))]
    Io(#[from] std::io::Error),

    #[error("render error: {0}")]
    #[diagnostic(code(shg::render))]
    Render(String),

    #[error("{0}")]
    #[diagnostic(code(shg::internal))]
    Internal(String),
}

/// Coarse classification of an error, mirroring HTTP status families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    Internal,
}

impl ErrorKind {
    /// HTTP-equivalent status code
    pub fn status(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Internal => 500,
        }
    }

    /// Process exit code used by the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::BadRequest => 2,
            ErrorKind::NotFound => 3,
            ErrorKind::Internal => 1,
        }
    }
}

impl ShgError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ShgError::Validation(msg.into())
    }

    /// "`<Noun>` not found" for an entity kind
    pub fn not_found(prefix: EntityPrefix) -> Self {
        ShgError::NotFound(format!("{} not found", prefix.noun()))
    }

    pub fn not_found_id(id: &EntityId) -> Self {
        ShgError::NotFound(format!("{} not found: {}", id.prefix().noun(), id))
    }

    /// Flatten a list of field errors into a single validation error.
    ///
    /// Only the first message survives; an empty list yields a generic message.
    pub fn from_field_errors(errors: Vec<String>) -> Self {
        ShgError::Validation(
            errors
                .into_iter()
                .next()
                .unwrap_or_else(|| "An error occurred.".to_string()),
        )
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ShgError::Validation(_) => ErrorKind::BadRequest,
            ShgError::NotFound(_) => ErrorKind::NotFound,
            ShgError::Database(_)
            | ShgError::Io(_)
            | ShgError::Render(_)
            | ShgError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<IdParseError> for ShgError {
    fn from(err: IdParseError) -> Self {
        ShgError::Validation(err.to_string())
    }
}

impl From<WorkspaceError> for ShgError {
    fn from(err: WorkspaceError) -> Self {
        match err {
            WorkspaceError::IoError(_) => ShgError::Internal(err.to_string()),
            _ => ShgError::Validation(err.to_string()),
        }
    }
}

impl From<csv::Error> for ShgError {
    fn from(err: csv::Error) -> Self {
        ShgError::Render(err.to_string())
    }
}

impl From<tera::Error> for ShgError {
    fn from(err: tera::Error) -> Self {
        ShgError::Render(err.to_string())
    }
}

impl From<serde_json::Error> for ShgError {
    fn from(err: serde_json::Error) -> Self {
        ShgError::Render(err.to_string())
    }
}

/// Uniform error body: `{"error": "<message>"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    /// Reduce a CLI diagnostic to the uniform body and its classification
    pub fn from_report(report: &miette::Report) -> (Self, ErrorKind) {
        match report.downcast_ref::<ShgError>() {
            Some(err) => (Self::from(err), err.kind()),
            None => (Self::new(report.to_string()), ErrorKind::Internal),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::json!({ "error": self.error }).to_string()
    }
}

impl From<&ShgError> for ErrorBody {
    fn from(err: &ShgError) -> Self {
        Self::new(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_status() {
        assert_eq!(ShgError::validation("bad").kind().status(), 400);
        assert_eq!(ShgError::not_found(EntityPrefix::Clu).kind().status(), 404);
        assert_eq!(ShgError::Internal("boom".into()).kind().status(), 500);
    }

    #[test]
    fn test_not_found_message() {
        let err = ShgError::not_found(EntityPrefix::Clu);
        assert_eq!(err.to_string(), "Cluster not found");
    }

    #[test]
    fn test_field_errors_flatten_to_first() {
        let err = ShgError::from_field_errors(vec![
            "age must be positive".to_string(),
            "name is required".to_string(),
        ]);
        assert_eq!(err.to_string(), "age must be positive");

        let empty = ShgError::from_field_errors(vec![]);
        assert_eq!(empty.to_string(), "An error occurred.");
    }

    #[test]
    fn test_error_body_json() {
        let body = ErrorBody::from(&ShgError::validation("Invalid date"));
        assert_eq!(body.to_json(), r#"{"error":"Invalid date"}"#);
    }

    #[test]
    fn test_error_body_from_report() {
        let report = miette::Report::new(ShgError::not_found(EntityPrefix::Shg));
        let (body, kind) = ErrorBody::from_report(&report);
        assert_eq!(body.error, "SelfHelpGroup not found");
        assert_eq!(kind, ErrorKind::NotFound);

        let other = miette::miette!("something else");
        let (body, kind) = ErrorBody::from_report(&other);
        assert_eq!(body.error, "something else");
        assert_eq!(kind, ErrorKind::Internal);
    }
}
