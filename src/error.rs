// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types shared by the session, guard, and task layers.

use std::fmt;

/// How the identity provider classified an authentication failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// Malformed email address.
    InvalidEmail,
    /// An account already exists for this email.
    EmailInUse,
    /// Password rejected by the provider's strength policy.
    WeakPassword,
    /// Unknown account or wrong password.
    InvalidCredentials,
    /// Account disabled by an administrator.
    UserDisabled,
    /// Transport failure before the provider could answer.
    Network,
    /// Anything else the provider reported.
    Provider,
}

/// Authentication failure reported by the identity provider.
///
/// The message is kept verbatim so callers can show exactly what the
/// provider said.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct AuthError {
    kind: AuthErrorKind,
    message: String,
}

impl AuthError {
    pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> AuthErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A single rejected field with its user-facing message.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Per-field validation failures for one submitted record.
#[derive(Debug, Clone, Default, thiserror::Error)]
#[error("{}", format_field_errors(.0))]
pub struct FieldErrors(pub Vec<FieldError>);

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl FieldErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// First message recorded for a field, if any.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = Vec::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                out.push(FieldError {
                    field: field.to_string(),
                    message,
                });
            }
        }
        // HashMap iteration order is unstable; keep messages deterministic.
        out.sort_by(|a, b| a.field.cmp(&b.field));
        Self(out)
    }
}

/// Application error type surfaced to callers of the session and task APIs.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Validation failed: {0}")]
    Validation(#[from] FieldErrors),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True when the failure is an absent document rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// Provider classification, when this is an authentication failure.
    pub fn auth_kind(&self) -> Option<AuthErrorKind> {
        match self {
            AppError::Auth(err) => Some(err.kind()),
            _ => None,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result type alias for session and task operations.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
        title: String,
    }

    #[test]
    fn test_auth_error_message_verbatim() {
        let err = AuthError::new(AuthErrorKind::EmailInUse, "EMAIL_EXISTS");
        assert_eq!(err.to_string(), "EMAIL_EXISTS");
        assert_eq!(err.kind(), AuthErrorKind::EmailInUse);

        let app: AppError = err.into();
        assert_eq!(app.to_string(), "EMAIL_EXISTS");
        assert_eq!(app.auth_kind(), Some(AuthErrorKind::EmailInUse));
    }

    #[test]
    fn test_field_errors_from_validator() {
        let sample = Sample {
            title: "ab".to_string(),
        };
        let errors = sample.validate().unwrap_err();
        let fields = FieldErrors::from(errors);

        assert_eq!(
            fields.message_for("title"),
            Some("Title must be at least 3 characters")
        );
        assert!(fields.to_string().contains("title:"));
    }

    #[test]
    fn test_not_found_helper() {
        let err = AppError::NotFound("tasks/u1/userTasks/t1".to_string());
        assert!(err.is_not_found());
        assert!(!AppError::Fetch("offline".to_string()).is_not_found());
    }
}
