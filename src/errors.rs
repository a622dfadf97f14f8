//! User-facing error taxonomy.
//!
//! Internal plumbing returns `anyhow::Result`; anything that reaches a screen
//! is converted into an [`AppError`] and from there into an [`Alert`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Validation,
    Network,
    Timeout,
    Generation,
    NotFound,
    Unknown,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("could not generate a recipe: {0}")]
    Generation(String),
    #[error("no recipe titled \"{0}\"")]
    NotFound(String),
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn generation(message: impl Into<String>) -> Self {
        AppError::Generation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Network(_) => ErrorKind::Network,
            AppError::Timeout(_) => ErrorKind::Timeout,
            AppError::Generation(_) => ErrorKind::Generation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Whether the alert should offer "Try Again". Validation and lookup
    /// failures need the user to change something first.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AppError::Validation(_) | AppError::NotFound(_))
    }

    pub fn to_alert(&self) -> Alert {
        let title = match self.kind() {
            ErrorKind::Validation => "Check your input",
            ErrorKind::Network => "Connection problem",
            ErrorKind::Timeout => "Taking too long",
            ErrorKind::Generation => "Couldn't create a recipe",
            ErrorKind::NotFound => "Recipe not found",
            ErrorKind::Unknown => "Something went wrong",
        };
        let message = match self {
            AppError::Unknown(_) => "An unexpected error occurred. Please try again.".to_string(),
            other => other.to_string(),
        };

        Alert {
            kind: self.kind(),
            title: title.to_string(),
            message,
            retryable: self.is_retryable(),
        }
    }
}

/// What a screen shows in its error dialog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub kind: ErrorKind,
    pub title: String,
    pub message: String,
    pub retryable: bool,
}

impl From<AppError> for Alert {
    fn from(err: AppError) -> Self {
        err.to_alert()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_alerts_do_not_offer_retry() {
        let alert = AppError::validation("Add at least one ingredient").to_alert();
        assert_eq!(alert.kind, ErrorKind::Validation);
        assert_eq!(alert.message, "Add at least one ingredient");
        assert!(!alert.retryable);
    }

    #[test]
    fn timeouts_are_retryable() {
        let err = AppError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "request timed out after 30s");
        assert!(err.to_alert().retryable);
    }

    #[test]
    fn unknown_errors_hide_internal_detail() {
        let err = AppError::from(anyhow::anyhow!("sqlite disk I/O error"));
        let alert = err.to_alert();
        assert_eq!(alert.kind, ErrorKind::Unknown);
        assert!(!alert.message.contains("sqlite"));
    }
}
