use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Machine-readable validation failure codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCode {
    InvalidPayload,
    MissingField,
    InvalidType,
    NonFinite,
    UnexpectedField,
    OutOfRange,
    InconsistentFields,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::InvalidPayload => "invalid_payload",
            ValidationCode::MissingField => "missing_field",
            ValidationCode::InvalidType => "invalid_type",
            ValidationCode::NonFinite => "non_finite",
            ValidationCode::UnexpectedField => "unexpected_field",
            ValidationCode::OutOfRange => "out_of_range",
            ValidationCode::InconsistentFields => "inconsistent_fields",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First violated rule of an incoming feature record
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{code}: {message}")]
pub struct ValidationError {
    pub code: ValidationCode,
    pub field: Option<String>,
    pub message: String,
}

impl ValidationError {
    pub fn new(code: ValidationCode, field: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            code,
            field: field.map(str::to_string),
            message: message.into(),
        }
    }
}

/// Errors raised by the predictor gateway
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("No model is currently loaded")]
    ModelUnavailable,

    #[error("Inference failed: {reason}")]
    InferenceError { reason: String },
}

impl PredictionError {
    pub fn inference(reason: impl Into<String>) -> Self {
        PredictionError::InferenceError {
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            PredictionError::ModelUnavailable => "model_unavailable",
            PredictionError::InferenceError { .. } => "inference_error",
        }
    }
}

/// Errors raised by the event store
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PersistenceError {
    #[error("Event store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Event write timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    #[error("Stored event is unreadable: {reason}")]
    Corrupt { reason: String },
}

impl From<sqlx::Error> for PersistenceError {
    fn from(err: sqlx::Error) -> Self {
        PersistenceError::Unavailable {
            reason: err.to_string(),
        }
    }
}

/// Error families tracked by the metrics exporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    ModelUnavailable,
    Inference,
    Persistence,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 4] = [
        ErrorKind::Validation,
        ErrorKind::ModelUnavailable,
        ErrorKind::Inference,
        ErrorKind::Persistence,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::ModelUnavailable => "model_unavailable",
            ErrorKind::Inference => "inference",
            ErrorKind::Persistence => "persistence",
        }
    }
}

impl From<&PredictionError> for ErrorKind {
    fn from(err: &PredictionError) -> Self {
        match err {
            PredictionError::ModelUnavailable => ErrorKind::ModelUnavailable,
            PredictionError::InferenceError { .. } => ErrorKind::Inference,
        }
    }
}
