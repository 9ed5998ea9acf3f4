use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResumeError {
    #[error("Malformed bencode at byte {offset}: {reason}")]
    MalformedEncoding { offset: usize, reason: String },

    #[error("Bencode nesting deeper than {max_depth} levels at byte {offset}")]
    NestingTooDeep { offset: usize, max_depth: usize },

    #[error("Field '{field}' has wrong type: expected {expected}, found {found}")]
    FieldTypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ResumeError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        ResumeError::MalformedEncoding {
            offset,
            reason: reason.into(),
        }
    }

    /// Byte offset for structural errors
    pub fn offset(&self) -> Option<usize> {
        match self {
            ResumeError::MalformedEncoding { offset, .. }
            | ResumeError::NestingTooDeep { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ResumeError>;
