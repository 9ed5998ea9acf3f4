use serde::Serialize;
use std::fmt;

/// Download priority of a piece or file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Skip,
    Low,
    Normal,
    High,
    Unknown(i64),
}

impl Priority {
    pub fn from_value(value: i64) -> Self {
        match value {
            0 => Priority::Skip,
            1 => Priority::Low,
            4 => Priority::Normal,
            7 => Priority::High,
            other => Priority::Unknown(other),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Priority::Unknown(_))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Skip => write!(f, "skip"),
            Priority::Low => write!(f, "low"),
            Priority::Normal => write!(f, "normal"),
            Priority::High => write!(f, "high"),
            Priority::Unknown(v) => write!(f, "unknown({})", v),
        }
    }
}
