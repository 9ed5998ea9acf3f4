use crate::resume::{
    analyze_completion, decode_bitfield, Completion, PeerTuples, Priority, ResumeRecord,
    UnfinishedPiece,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Block-level progress of one unfinished piece
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockProgress {
    pub piece: i64,
    pub blocks: Completion,
    pub adler32: Option<i64>,
    #[serde(skip)]
    pub bits: Vec<bool>,
}

impl BlockProgress {
    pub fn from_unfinished(entry: &UnfinishedPiece) -> Self {
        let bits = decode_bitfield(&entry.bitmask, None);
        Self {
            piece: entry.piece,
            blocks: analyze_completion(&bits),
            adler32: entry.adler32,
            bits,
        }
    }

    pub fn has_bitmask(&self) -> bool {
        !self.bits.is_empty()
    }

    /// Bitmask as a string of 1s and 0s
    pub fn bitmap(&self) -> String {
        self.bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
    }
}

/// Number of pieces per raw priority byte
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PriorityHistogram(BTreeMap<u8, usize>);

impl PriorityHistogram {
    pub fn from_bytes(priorities: &[u8]) -> Self {
        let mut counts = BTreeMap::new();
        for &p in priorities {
            *counts.entry(p).or_default() += 1;
        }
        Self(counts)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn count(&self, value: u8) -> usize {
        self.0.get(&value).copied().unwrap_or(0)
    }

    /// Buckets in ascending byte order
    pub fn iter(&self) -> impl Iterator<Item = (u8, Priority, usize)> + '_ {
        self.0
            .iter()
            .map(|(&value, &count)| (value, Priority::from_value(i64::from(value)), count))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeerCounts {
    pub ipv4: PeerTuples,
    pub ipv6: PeerTuples,
    pub banned: PeerTuples,
}

/// Figures derived from a resume record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    /// Completion over the pieces the record lists
    pub pieces: Completion,
    /// Every bit of the `pieces` bitfield, padding included
    pub pieces_raw: Completion,
    pub verified: Completion,
    pub unfinished: Vec<BlockProgress>,
    pub piece_priorities: PriorityHistogram,
    pub file_priorities: Vec<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_ratio: Option<f64>,
    pub peers: PeerCounts,
    #[serde(skip)]
    pub piece_bits: Vec<bool>,
}

impl Metrics {
    pub fn from_record(record: &ResumeRecord) -> Self {
        let piece_count = record.piece_count();
        let piece_bits = decode_bitfield(&record.pieces, piece_count);
        let verified_bits = decode_bitfield(&record.verified_pieces, piece_count);

        Self {
            pieces: analyze_completion(&piece_bits),
            pieces_raw: analyze_completion(&decode_bitfield(&record.pieces, None)),
            verified: analyze_completion(&verified_bits),
            unfinished: record
                .unfinished
                .iter()
                .map(BlockProgress::from_unfinished)
                .collect(),
            piece_priorities: PriorityHistogram::from_bytes(&record.piece_priority),
            file_priorities: record
                .file_priority
                .iter()
                .map(|&p| Priority::from_value(p))
                .collect(),
            share_ratio: share_ratio(
                record.counters.total_uploaded,
                record.counters.total_downloaded,
            ),
            peers: PeerCounts {
                ipv4: record.peers.tuples,
                ipv6: record.peers6.tuples,
                banned: record.banned_peers.tuples,
            },
            piece_bits,
        }
    }
}

/// Uploaded over downloaded; `None` until something was downloaded
pub fn share_ratio(uploaded: i64, downloaded: i64) -> Option<f64> {
    (downloaded > 0).then(|| uploaded as f64 / downloaded as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bencode::encode;
    use crate::resume::parse_resume;
    use crate::resume::tests::sample_record;
    use bytes::Bytes;

    fn sample_metrics() -> Metrics {
        let resume = parse_resume(&encode(&sample_record())).unwrap();
        Metrics::from_record(&resume.record)
    }

    #[test]
    fn test_piece_completion_uses_piece_count() {
        let metrics = sample_metrics();
        // 0xf0 0x80 cut to the 9 pieces listed in piece_priority
        assert_eq!(metrics.pieces.completed, 5);
        assert_eq!(metrics.pieces.total, 9);
        assert_eq!(metrics.piece_bits.len(), 9);
        assert_eq!(metrics.pieces_raw.completed, 5);
        assert_eq!(metrics.pieces_raw.total, 16);
        assert_eq!(metrics.verified.completed, 2);
        assert_eq!(metrics.verified.total, 8);
    }

    #[test]
    fn test_raw_bits_without_piece_count() {
        let resume = parse_resume(b"d6:pieces2:\xff\x01e").unwrap();
        let metrics = Metrics::from_record(&resume.record);
        assert_eq!(metrics.pieces, metrics.pieces_raw);
        assert_eq!(metrics.pieces.completed, 9);
        assert_eq!(metrics.pieces.total, 16);
    }

    #[test]
    fn test_block_progress() {
        let metrics = sample_metrics();
        let progress = &metrics.unfinished[0];
        assert_eq!(progress.piece, 5);
        assert_eq!(progress.blocks.completed, 3);
        assert_eq!(progress.blocks.total, 8);
        assert_eq!(progress.blocks.percentage, 37.5);
        assert_eq!(progress.blocks.remaining_percentage(), 62.5);
        assert_eq!(progress.bitmap(), "11100000");
        assert_eq!(progress.adler32, Some(12345));
    }

    #[test]
    fn test_block_progress_without_bitmask() {
        let progress = BlockProgress::from_unfinished(&UnfinishedPiece {
            piece: 2,
            bitmask: Bytes::new(),
            adler32: None,
        });
        assert!(!progress.has_bitmask());
        assert_eq!(progress.blocks.percentage, 0.0);
    }

    #[test]
    fn test_priority_histogram() {
        let histogram = PriorityHistogram::from_bytes(&[4, 4, 7, 0, 200, 4]);
        assert_eq!(histogram.count(4), 3);
        assert_eq!(histogram.count(1), 0);

        let buckets: Vec<_> = histogram.iter().collect();
        assert_eq!(
            buckets,
            vec![
                (0, Priority::Skip, 1),
                (4, Priority::Normal, 3),
                (7, Priority::High, 1),
                (200, Priority::Unknown(200), 1),
            ]
        );
    }

    #[test]
    fn test_share_ratio() {
        assert_eq!(share_ratio(3072, 1024), Some(3.0));
        assert_eq!(share_ratio(100, 0), None);
        assert_eq!(share_ratio(0, 0), None);
        assert_eq!(sample_metrics().share_ratio, Some(3.0));
    }

    #[test]
    fn test_peer_counts_and_file_priorities() {
        let metrics = sample_metrics();
        assert_eq!(metrics.peers.ipv4.count, 1);
        assert_eq!(metrics.peers.ipv6.count, 2);
        assert_eq!(metrics.peers.banned.count, 0);
        assert_eq!(metrics.file_priorities, vec![Priority::Normal, Priority::Skip]);
    }

    #[test]
    fn test_metrics_json_omits_missing_ratio() {
        let resume = parse_resume(b"de").unwrap();
        let json = serde_json::to_value(Metrics::from_record(&resume.record)).unwrap();
        assert!(json.get("share_ratio").is_none());
        assert_eq!(json["pieces"]["total"], 0);
        assert_eq!(json["pieces_raw"]["total"], 0);
    }
}
