use crate::error::ResumeError;
use serde::Serialize;
use thiserror::Error;

/// Something structurally valid but suspicious in a resume record.
///
/// Anomalies never abort decoding; they are collected on the record.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    #[error("file format tag is '{found}', expected '{expected}'")]
    FormatTagMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("{field} is {found} bytes long, expected {expected}")]
    InfoHashLength {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{field} has {remainder} stray bytes after {count} whole {width}-byte tuples")]
    PeerBufferRemainder {
        field: &'static str,
        width: usize,
        count: usize,
        remainder: usize,
    },

    #[error("piece priority {value} is not a known level ({pieces} pieces)")]
    UnknownPriority { value: u8, pieces: usize },

    #[error("field '{field}' expected {expected}, found {found}; default used")]
    FieldTypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("unreadable field: {message}")]
    Unreadable { message: String },
}

impl From<ResumeError> for Anomaly {
    fn from(err: ResumeError) -> Self {
        match err {
            ResumeError::FieldTypeMismatch {
                field,
                expected,
                found,
            } => Anomaly::FieldTypeMismatch {
                field,
                expected,
                found,
            },
            other => Anomaly::Unreadable {
                message: other.to_string(),
            },
        }
    }
}
