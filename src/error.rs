use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Kind of per-company artifact the pipeline needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Model,
    Features,
    Stats,
    Scaler,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::Model => "model",
            ArtifactKind::Features => "selected features",
            ArtifactKind::Stats => "residual stats",
            ArtifactKind::Scaler => "scaler",
        };
        f.write_str(name)
    }
}

/// Failures of the signal pipeline. Every one of them is fatal for the request.
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("No price data for {ticker}: {reason}")]
    DataUnavailable { ticker: String, reason: String },

    #[error("Input data has {available} usable rows, but at least {required} are required")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Feature mismatch: selected feature index ({index}) exceeds available columns ({columns})")]
    FeatureMismatch { index: usize, columns: usize },

    #[error("{kind} not found for {company}: {}", path.display())]
    ArtifactNotFound {
        kind: ArtifactKind,
        company: String,
        path: PathBuf,
    },

    #[error("Malformed artifact {}: {reason}", path.display())]
    MalformedArtifact { path: PathBuf, reason: String },

    #[error("Inference failed: {0}")]
    InferenceFailure(String),

    #[error("Failed to persist results: {0}")]
    Persist(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl SignalError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        SignalError::MalformedArtifact {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for SignalError {
    fn from(err: tokio::task::JoinError) -> Self {
        SignalError::Task(err.to_string())
    }
}

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl From<SignalError> for AppError {
    fn from(err: SignalError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
