mod anomaly;
mod bits;
mod fields;
mod peers;
mod priority;
mod record;

pub use anomaly::Anomaly;
pub use bits::{
    analyze_completion, decode_bitfield, decode_peer_tuples, Completion, PeerTuples,
};
pub use fields::{policy, Fields, Shape};
pub use peers::{AddressFamily, PeerList};
pub use priority::Priority;
pub use record::{
    Counters, Flags, Limit, Limits, ResumeRecord, Swarm, UnfinishedPiece, FILE_FORMAT_TAG,
};

use crate::bencode::{decode, BencodeValue};
use crate::error::Result;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// A decoded resume file: the raw value tree and its typed projection
#[derive(Debug, Clone)]
pub struct Resume {
    pub root: BencodeValue,
    pub record: ResumeRecord,
}

/// Load and parse a .fastresume file
pub async fn load_resume_file<P: AsRef<Path>>(path: P) -> Result<Resume> {
    let data = fs::read(path.as_ref()).await?;
    debug!("Read {} bytes from {}", data.len(), path.as_ref().display());
    parse_resume(&data)
}

/// Parse resume data from bytes
pub fn parse_resume(data: &[u8]) -> Result<Resume> {
    let root = decode(data)?;
    let record = ResumeRecord::from_bencode(&root)?;
    Ok(Resume { root, record })
}
