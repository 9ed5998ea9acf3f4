mod format;
mod metrics;

pub use format::{format_bytes, format_duration, format_timestamp};
pub use metrics::{share_ratio, BlockProgress, Metrics, PeerCounts, PriorityHistogram};
