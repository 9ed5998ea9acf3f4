use super::anomaly::Anomaly;
use super::fields::{integer_default, Fields};
use super::peers::{AddressFamily, PeerList};
use super::priority::Priority;
use crate::bencode::BencodeValue;
use crate::error::Result;
use bytes::Bytes;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::warn;

/// Value of the `file-format` key in a well-formed record
pub const FILE_FORMAT_TAG: &str = "libtorrent resume file";

const INFO_HASH_V1_LEN: usize = 20;
const INFO_HASH_V2_LEN: usize = 32;

fn hex_bytes<S: Serializer>(
    bytes: &Bytes,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}

fn hex_opt<S: Serializer>(
    bytes: &Option<Bytes>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match bytes {
        Some(b) => serializer.serialize_some(&hex::encode(b)),
        None => serializer.serialize_none(),
    }
}

/// A limit where a negative raw value means "no limit"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Limit {
    Unlimited,
    Limited(u64),
}

impl Limit {
    pub fn from_raw(raw: i64) -> Self {
        u64::try_from(raw).map_or(Limit::Unlimited, Limit::Limited)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Limits {
    pub upload_rate: Limit,
    pub download_rate: Limit,
    pub max_connections: Limit,
    pub max_uploads: Limit,
}

/// Cumulative transfer totals, durations in seconds and Unix timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Counters {
    pub total_uploaded: i64,
    pub total_downloaded: i64,
    pub active_time: i64,
    pub seeding_time: i64,
    pub finished_time: i64,
    pub added_time: i64,
    pub completed_time: i64,
    pub last_seen_complete: i64,
}

/// Tracker-reported swarm counts; `None` when unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Swarm {
    pub num_complete: Option<u64>,
    pub num_incomplete: Option<u64>,
    pub num_downloaded: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Flags {
    pub auto_managed: bool,
    pub paused: bool,
    pub sequential_download: bool,
    pub seed_mode: bool,
    pub super_seeding: bool,
}

/// A partially downloaded piece
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnfinishedPiece {
    /// -1 when the entry carries no index
    pub piece: i64,
    /// One bit per block, most significant bit first
    #[serde(serialize_with = "hex_bytes")]
    pub bitmask: Bytes,
    pub adler32: Option<i64>,
}

/// Typed projection of a decoded resume file
#[derive(Debug, Clone, Serialize)]
pub struct ResumeRecord {
    pub file_format: String,
    pub file_version: i64,
    #[serde(serialize_with = "hex_opt")]
    pub info_hash: Option<Bytes>,
    #[serde(serialize_with = "hex_opt")]
    pub info_hash_v2: Option<Bytes>,
    pub name: String,
    pub save_path: String,

    #[serde(serialize_with = "hex_bytes")]
    pub pieces: Bytes,
    #[serde(serialize_with = "hex_bytes")]
    pub piece_priority: Bytes,
    #[serde(serialize_with = "hex_bytes")]
    pub verified_pieces: Bytes,
    pub unfinished: Vec<UnfinishedPiece>,

    pub trackers: Vec<Vec<String>>,
    pub file_priority: Vec<i64>,
    pub mapped_files: Vec<String>,
    pub limits: Limits,

    pub counters: Counters,
    pub swarm: Swarm,
    pub flags: Flags,

    pub peers: PeerList,
    pub peers6: PeerList,
    pub banned_peers: PeerList,

    pub anomalies: Vec<Anomaly>,
}

/// Collects anomalies while fields are projected
#[derive(Default)]
struct Anomalies(Vec<Anomaly>);

impl Anomalies {
    fn push(&mut self, anomaly: Anomaly) {
        warn!("Resume anomaly: {}", anomaly);
        self.0.push(anomaly);
    }

    fn take<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.push(err.into());
                None
            }
        }
    }

    fn int(&mut self, fields: &Fields<'_>, key: &str) -> i64 {
        self.take(fields.int(key))
            .unwrap_or_else(|| integer_default(key))
    }

    fn flag(&mut self, fields: &Fields<'_>, key: &str) -> bool {
        self.take(fields.flag(key)).unwrap_or(false)
    }

    fn text(&mut self, fields: &Fields<'_>, key: &str) -> String {
        self.take(fields.text(key)).unwrap_or_default()
    }

    /// Entries that fail to read as text keep their position as ""
    fn texts(&mut self, entries: Vec<Result<String>>) -> Vec<String> {
        entries
            .into_iter()
            .map(|entry| self.take(entry).unwrap_or_default())
            .collect()
    }

    fn bytes(&mut self, fields: &Fields<'_>, key: &str) -> Bytes {
        self.take(fields.bytes(key)).unwrap_or_default()
    }

    fn peers(
        &mut self,
        fields: &Fields<'_>,
        key: &'static str,
        family: AddressFamily,
    ) -> PeerList {
        let list = PeerList::from_compact_list(&self.bytes(fields, key), family);
        if list.tuples.is_malformed() {
            self.push(Anomaly::PeerBufferRemainder {
                field: key,
                width: family.tuple_width(),
                count: list.tuples.count,
                remainder: list.tuples.remainder,
            });
        }
        list
    }
}

fn count(raw: i64) -> Option<u64> {
    u64::try_from(raw).ok()
}

impl ResumeRecord {
    /// Project a decoded root value into a record.
    ///
    /// Only a root that is not a dictionary fails; every other problem is
    /// kept as an anomaly and the affected field takes its default.
    pub fn from_bencode(value: &BencodeValue) -> Result<Self> {
        let fields = Fields::new(value)?;
        let mut anomalies = Anomalies::default();

        let file_format = anomalies.text(&fields, "file-format");
        if file_format != FILE_FORMAT_TAG {
            anomalies.push(Anomaly::FormatTagMismatch {
                expected: FILE_FORMAT_TAG,
                found: file_format.clone(),
            });
        }

        let info_hash = Some(anomalies.bytes(&fields, "info-hash")).filter(|h| !h.is_empty());
        if let Some(hash) = &info_hash {
            if hash.len() != INFO_HASH_V1_LEN {
                anomalies.push(Anomaly::InfoHashLength {
                    field: "info-hash",
                    expected: INFO_HASH_V1_LEN,
                    found: hash.len(),
                });
            }
        }

        // An all-zero v2 hash is how v1-only torrents leave the slot empty
        let info_hash_v2 = Some(anomalies.bytes(&fields, "info-hash2")).filter(|h| {
            !(h.is_empty() || (h.len() == INFO_HASH_V2_LEN && h.iter().all(|&b| b == 0)))
        });
        if let Some(hash) = &info_hash_v2 {
            if hash.len() != INFO_HASH_V2_LEN {
                anomalies.push(Anomaly::InfoHashLength {
                    field: "info-hash2",
                    expected: INFO_HASH_V2_LEN,
                    found: hash.len(),
                });
            }
        }

        let piece_priority = anomalies.bytes(&fields, "piece_priority");
        let mut unknown: BTreeMap<u8, usize> = BTreeMap::new();
        for &p in piece_priority.iter() {
            if !Priority::from_value(i64::from(p)).is_known() {
                *unknown.entry(p).or_default() += 1;
            }
        }
        for (value, pieces) in unknown {
            anomalies.push(Anomaly::UnknownPriority { value, pieces });
        }

        let unfinished = parse_unfinished(&fields, &mut anomalies);

        let mut trackers = Vec::new();
        for tier in anomalies.take(fields.tiers("trackers")).unwrap_or_default() {
            let Some(urls) = anomalies.take(tier) else {
                continue;
            };
            let urls: Vec<String> = urls
                .into_iter()
                .filter_map(|url| anomalies.take(url))
                .collect();
            trackers.push(urls);
        }

        let mapped_files = anomalies
            .take(fields.text_list("mapped_files"))
            .unwrap_or_default();
        let mapped_files = anomalies.texts(mapped_files);

        let limits = Limits {
            upload_rate: Limit::from_raw(anomalies.int(&fields, "upload_rate_limit")),
            download_rate: Limit::from_raw(anomalies.int(&fields, "download_rate_limit")),
            max_connections: Limit::from_raw(anomalies.int(&fields, "max_connections")),
            max_uploads: Limit::from_raw(anomalies.int(&fields, "max_uploads")),
        };

        let counters = Counters {
            total_uploaded: anomalies.int(&fields, "total_uploaded"),
            total_downloaded: anomalies.int(&fields, "total_downloaded"),
            active_time: anomalies.int(&fields, "active_time"),
            seeding_time: anomalies.int(&fields, "seeding_time"),
            finished_time: anomalies.int(&fields, "finished_time"),
            added_time: anomalies.int(&fields, "added_time"),
            completed_time: anomalies.int(&fields, "completed_time"),
            last_seen_complete: anomalies.int(&fields, "last_seen_complete"),
        };

        let swarm = Swarm {
            num_complete: count(anomalies.int(&fields, "num_complete")),
            num_incomplete: count(anomalies.int(&fields, "num_incomplete")),
            num_downloaded: count(anomalies.int(&fields, "num_downloaded")),
        };

        let flags = Flags {
            auto_managed: anomalies.flag(&fields, "auto_managed"),
            paused: anomalies.flag(&fields, "paused"),
            sequential_download: anomalies.flag(&fields, "sequential_download"),
            seed_mode: anomalies.flag(&fields, "seed_mode"),
            super_seeding: anomalies.flag(&fields, "super_seeding"),
        };

        Ok(ResumeRecord {
            file_version: anomalies.int(&fields, "file-version"),
            name: anomalies.text(&fields, "name"),
            save_path: anomalies.text(&fields, "save_path"),
            pieces: anomalies.bytes(&fields, "pieces"),
            verified_pieces: anomalies.bytes(&fields, "verified_pieces"),
            file_priority: anomalies
                .take(fields.priorities("file_priority"))
                .unwrap_or_default(),
            mapped_files,
            peers: anomalies.peers(&fields, "peers", AddressFamily::V4),
            peers6: anomalies.peers(&fields, "peers6", AddressFamily::V6),
            banned_peers: anomalies.peers(&fields, "banned_peers", AddressFamily::V4),
            file_format,
            info_hash,
            info_hash_v2,
            piece_priority,
            unfinished,
            trackers,
            limits,
            counters,
            swarm,
            flags,
            anomalies: anomalies.0,
        })
    }

    /// Number of pieces implied by `piece_priority` (one byte per piece),
    /// when it fits inside the completion bitfield
    pub fn piece_count(&self) -> Option<usize> {
        let count = self.piece_priority.len();
        (count > 0 && count <= self.pieces.len() * 8).then_some(count)
    }

    pub fn info_hash_hex(&self) -> Option<String> {
        self.info_hash.as_ref().map(hex::encode)
    }

    pub fn info_hash_v2_hex(&self) -> Option<String> {
        self.info_hash_v2.as_ref().map(hex::encode)
    }
}

fn parse_unfinished(fields: &Fields<'_>, anomalies: &mut Anomalies) -> Vec<UnfinishedPiece> {
    let entries = anomalies
        .take(fields.dict_list("unfinished"))
        .unwrap_or_default();

    let mut unfinished = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        let Some(dict) = anomalies.take(entry) else {
            continue;
        };
        let entry = Fields::nested(dict, format!("unfinished[{}]", i));
        let adler32 = anomalies.int(&entry, "adler32");

        unfinished.push(UnfinishedPiece {
            piece: anomalies.int(&entry, "piece"),
            bitmask: anomalies.bytes(&entry, "bitmask"),
            adler32: (adler32 != 0).then_some(adler32),
        });
    }

    unfinished
}
