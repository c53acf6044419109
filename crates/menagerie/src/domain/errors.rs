//! Domain Errors
//!
//! Error types for graph, session and signing operations.
//! "Not found" and tombstoned records are never errors; readers model them as absence.

use std::fmt;

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error(transparent)]
    Ack(#[from] AckError),

    #[error("Delete of {id} failed: {}", describe_delete(.unlink, .tombstone))]
    Delete {
        id: String,
        unlink: Option<AckError>,
        tombstone: Option<AckError>,
    },

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx backend response, already reduced to a display string
    #[error("{0}")]
    Backend(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DomainError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_authenticated() -> Self {
        Self::NotAuthenticated("no authenticated identity or key material".to_string())
    }

    pub fn codec<T: AsRef<str>>(record_kind: T, detail: impl fmt::Display) -> Self {
        Self::Codec(format!("{}: {}", record_kind.as_ref(), detail))
    }
}

fn describe_delete(unlink: &Option<AckError>, tombstone: &Option<AckError>) -> String {
    match (unlink, tombstone) {
        (Some(u), Some(t)) => format!("unlink: {u}; tombstone: {t}"),
        (Some(u), None) => format!("unlink: {u}"),
        (None, Some(t)) => format!("tombstone: {t}"),
        (None, None) => "no failure recorded".to_string(),
    }
}

/// Graph operation a store acknowledgment refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AckOperation {
    Put,
    Link,
    Unlink,
}

impl fmt::Display for AckOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AckOperation::Put => write!(f, "put"),
            AckOperation::Link => write!(f, "link"),
            AckOperation::Unlink => write!(f, "unlink"),
        }
    }
}

/// The store rejected a write or link operation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("store rejected {operation} of {target}: {detail}")]
pub struct AckError {
    pub operation: AckOperation,
    pub target: String,
    pub detail: String,
}

impl AckError {
    pub fn new(operation: AckOperation, target: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            operation,
            target: target.into(),
            detail: detail.into(),
        }
    }
}

/// Step of the signing pipeline that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningStage {
    Serialize,
    Sign,
    Transcode,
}

impl fmt::Display for SigningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningStage::Serialize => write!(f, "serialize"),
            SigningStage::Sign => write!(f, "sign"),
            SigningStage::Transcode => write!(f, "transcode"),
        }
    }
}

/// Aggregated signing failure; no partial signature accompanies it
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("signing failed during {stage}: {detail}")]
pub struct SigningError {
    pub stage: SigningStage,
    pub detail: String,
}

impl SigningError {
    pub fn new(stage: SigningStage, detail: impl Into<String>) -> Self {
        Self {
            stage,
            detail: detail.into(),
        }
    }
}
