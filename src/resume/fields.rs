//! Typed projections of root dictionary entries.
//!
//! Every known resume key has one entry in [`FIELD_POLICIES`] describing its
//! expected shape and the value used when the key is absent. Accessors on
//! [`Fields`] are strict about shape. Text reads are lossy for byte strings
//! and integers but refuse lists and dictionaries.

use crate::bencode::{BencodeDict, BencodeValue};
use crate::error::{ResumeError, Result};
use bytes::Bytes;

/// Expected shape of a resume field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Byte string shown as text
    Text,
    /// Byte string holding packed binary data
    Binary,
    /// Integer with the value used when absent
    Integer { default: i64 },
    /// Integer read as zero / nonzero
    Flag,
    /// List of byte strings
    TextList,
    /// List of lists of byte strings
    Tiers,
    /// List of dictionaries
    DictList,
    /// List of integers, or one byte per entry
    PriorityList,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldPolicy {
    pub key: &'static str,
    pub shape: Shape,
}

const fn field(key: &'static str, shape: Shape) -> FieldPolicy {
    FieldPolicy { key, shape }
}

const UNSET: Shape = Shape::Integer { default: -1 };
const ZERO: Shape = Shape::Integer { default: 0 };

pub const FIELD_POLICIES: &[FieldPolicy] = &[
    // identity
    field("file-format", Shape::Text),
    field("file-version", ZERO),
    field("info-hash", Shape::Binary),
    field("info-hash2", Shape::Binary),
    field("name", Shape::Text),
    field("save_path", Shape::Text),
    // piece state
    field("pieces", Shape::Binary),
    field("piece_priority", Shape::Binary),
    field("verified_pieces", Shape::Binary),
    field("unfinished", Shape::DictList),
    // entries of `unfinished`
    field("piece", UNSET),
    field("bitmask", Shape::Binary),
    field("adler32", ZERO),
    // network config
    field("trackers", Shape::Tiers),
    field("httpseeds", Shape::TextList),
    field("url-list", Shape::TextList),
    field("qBt-tags", Shape::TextList),
    field("file_priority", Shape::PriorityList),
    field("mapped_files", Shape::TextList),
    field("upload_rate_limit", UNSET),
    field("download_rate_limit", UNSET),
    field("max_connections", UNSET),
    field("max_uploads", UNSET),
    // counters
    field("total_uploaded", ZERO),
    field("total_downloaded", ZERO),
    field("active_time", ZERO),
    field("seeding_time", ZERO),
    field("finished_time", ZERO),
    field("added_time", ZERO),
    field("completed_time", ZERO),
    field("last_seen_complete", ZERO),
    field("num_complete", UNSET),
    field("num_incomplete", UNSET),
    field("num_downloaded", UNSET),
    // flags
    field("auto_managed", Shape::Flag),
    field("paused", Shape::Flag),
    field("sequential_download", Shape::Flag),
    field("seed_mode", Shape::Flag),
    field("super_seeding", Shape::Flag),
    // peers
    field("peers", Shape::Binary),
    field("peers6", Shape::Binary),
    field("banned_peers", Shape::Binary),
];

/// Look up the policy registered for a key
pub fn policy(key: &[u8]) -> Option<&'static FieldPolicy> {
    FIELD_POLICIES.iter().find(|p| p.key.as_bytes() == key)
}

/// Value an integer field takes when absent or unreadable
pub fn integer_default(key: &str) -> i64 {
    match policy(key.as_bytes()).map(|p| p.shape) {
        Some(Shape::Integer { default }) => default,
        _ => 0,
    }
}

fn mismatch(field: &str, expected: &'static str, found: &BencodeValue) -> ResumeError {
    ResumeError::FieldTypeMismatch {
        field: field.to_string(),
        expected,
        found: found.kind(),
    }
}

/// Lossy text of a scalar; containers have no text form
fn scalar_text(field: &str, value: &BencodeValue) -> Result<String> {
    match value {
        BencodeValue::String(_) | BencodeValue::Integer(_) => Ok(value.to_text_lossy()),
        other => Err(mismatch(field, "byte string", other)),
    }
}

/// Typed view over the root dictionary of a resume record, or over a
/// dictionary nested inside it
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    dict: &'a BencodeDict,
    scope: String,
}

impl<'a> Fields<'a> {
    /// The root of a resume record must be a dictionary
    pub fn new(root: &'a BencodeValue) -> Result<Self> {
        let dict = root
            .as_dict()
            .ok_or_else(|| mismatch("<root>", "dictionary", root))?;
        Ok(Self::nested(dict, String::new()))
    }

    /// View over a nested dictionary; `scope` prefixes field names in errors
    pub fn nested(dict: &'a BencodeDict, scope: String) -> Self {
        Self { dict, scope }
    }

    fn path(&self, key: &str) -> String {
        if self.scope.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.scope, key)
        }
    }

    pub fn get(&self, key: &str) -> Option<&'a BencodeValue> {
        self.dict.get(key.as_bytes())
    }

    /// Text field; absent yields an empty string. Invalid UTF-8 is replaced,
    /// integers print in decimal, lists and dictionaries are a mismatch.
    pub fn text(&self, key: &str) -> Result<String> {
        match self.get(key) {
            None => Ok(String::new()),
            Some(value) => scalar_text(&self.path(key), value),
        }
    }

    /// Raw byte field; absent yields an empty buffer
    pub fn bytes(&self, key: &str) -> Result<Bytes> {
        match self.get(key) {
            None => Ok(Bytes::new()),
            Some(BencodeValue::String(b)) => Ok(b.clone()),
            Some(other) => Err(mismatch(&self.path(key), "byte string", other)),
        }
    }

    /// Integer field; absent yields the default from the policy table
    pub fn int(&self, key: &str) -> Result<i64> {
        match self.get(key) {
            None => Ok(integer_default(key)),
            Some(BencodeValue::Integer(i)) => Ok(*i),
            Some(other) => Err(mismatch(&self.path(key), "integer", other)),
        }
    }

    pub fn flag(&self, key: &str) -> Result<bool> {
        self.int(key).map(|v| v != 0)
    }

    /// List field; absent yields an empty slice
    pub fn list(&self, key: &str) -> Result<&'a [BencodeValue]> {
        match self.get(key) {
            None => Ok(&[]),
            Some(BencodeValue::List(l)) => Ok(l),
            Some(other) => Err(mismatch(&self.path(key), "list", other)),
        }
    }

    /// List of text entries, each read like [`Fields::text`]. Positions are
    /// kept, so a bad entry is a per-element error.
    pub fn text_list(&self, key: &str) -> Result<Vec<Result<String>>> {
        let path = self.path(key);
        Ok(self
            .list(key)?
            .iter()
            .enumerate()
            .map(|(i, item)| scalar_text(&format!("{}[{}]", path, i), item))
            .collect())
    }

    /// List of dictionaries. Elements that are not dictionaries come back as
    /// per-element errors instead of failing the whole list.
    pub fn dict_list(&self, key: &str) -> Result<Vec<Result<&'a BencodeDict>>> {
        let path = self.path(key);
        Ok(self
            .list(key)?
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_dict()
                    .ok_or_else(|| mismatch(&format!("{}[{}]", path, i), "dictionary", item))
            })
            .collect())
    }

    /// Ordered tiers of URLs. A tier that is not a list is a per-tier error,
    /// a URL that is not text a per-URL error.
    pub fn tiers(&self, key: &str) -> Result<Vec<Result<Vec<Result<String>>>>> {
        let path = self.path(key);
        Ok(self
            .list(key)?
            .iter()
            .enumerate()
            .map(|(i, tier)| -> Result<Vec<Result<String>>> {
                let tier_path = format!("{}[{}]", path, i);
                let urls = tier
                    .as_list()
                    .ok_or_else(|| mismatch(&tier_path, "list", tier))?;
                Ok(urls
                    .iter()
                    .enumerate()
                    .map(|(j, url)| scalar_text(&format!("{}[{}]", tier_path, j), url))
                    .collect())
            })
            .collect())
    }

    /// Per-entry priorities: a list of integers, or a byte string with one
    /// byte per entry.
    pub fn priorities(&self, key: &str) -> Result<Vec<i64>> {
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(BencodeValue::String(b)) => Ok(b.iter().map(|&p| i64::from(p)).collect()),
            Some(BencodeValue::List(items)) => {
                let path = self.path(key);
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        item.as_integer().ok_or_else(|| {
                            mismatch(&format!("{}[{}]", path, i), "integer", item)
                        })
                    })
                    .collect()
            }
            Some(other) => Err(mismatch(&self.path(key), "list", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bencode::decode;

    fn root() -> BencodeValue {
        decode(
            b"d4:name3:\xe4\xb8\xad6:pausedi1e5:peers6:\x01\x02\x03\x04\x00\x50\
              10:unfinishedld5:piecei1eei7ee8:trackersll3:urlei3ee\
              13:file_priorityli4ei0ee11:file-format3:abce",
        )
        .unwrap()
    }

    #[test]
    fn test_root_must_be_dict() {
        let value = BencodeValue::Integer(1);
        match Fields::new(&value) {
            Err(ResumeError::FieldTypeMismatch { field, found, .. }) => {
                assert_eq!(field, "<root>");
                assert_eq!(found, "integer");
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_absent_fields_use_policy_defaults() {
        let value = BencodeValue::Dict(BencodeDict::new());
        let fields = Fields::new(&value).unwrap();
        assert_eq!(fields.text("name").unwrap(), "");
        assert!(fields.bytes("pieces").unwrap().is_empty());
        assert_eq!(fields.int("file-version").unwrap(), 0);
        assert_eq!(fields.int("upload_rate_limit").unwrap(), -1);
        assert_eq!(fields.int("num_complete").unwrap(), -1);
        assert_eq!(fields.int("not-a-known-field").unwrap(), 0);
        assert!(!fields.flag("paused").unwrap());
        assert!(fields.list("trackers").unwrap().is_empty());
        assert!(fields.priorities("file_priority").unwrap().is_empty());
    }

    #[test]
    fn test_text_is_lossy() {
        let value = decode(b"d4:name2:a\xffe").unwrap();
        let fields = Fields::new(&value).unwrap();
        assert_eq!(fields.text("name").unwrap(), "a\u{fffd}");

        let value = root();
        let fields = Fields::new(&value).unwrap();
        assert_eq!(fields.text("name").unwrap(), "中");
        assert_eq!(fields.text("paused").unwrap(), "1");
    }

    #[test]
    fn test_text_refuses_containers() {
        let value = root();
        let fields = Fields::new(&value).unwrap();
        match fields.text("trackers") {
            Err(ResumeError::FieldTypeMismatch { field, found, .. }) => {
                assert_eq!(field, "trackers");
                assert_eq!(found, "list");
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_text_list_reports_elements() {
        let value = decode(b"d12:mapped_filesl1:ali1ee1:bi5eee").unwrap();
        let fields = Fields::new(&value).unwrap();
        let entries = fields.text_list("mapped_files").unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].as_ref().unwrap(), "a");
        match &entries[1] {
            Err(ResumeError::FieldTypeMismatch { field, .. }) => {
                assert_eq!(field, "mapped_files[1]")
            }
            other => panic!("expected element mismatch, got {:?}", other),
        }
        assert_eq!(entries[2].as_ref().unwrap(), "b");
        assert_eq!(entries[3].as_ref().unwrap(), "5");
    }

    #[test]
    fn test_integer_wrong_shape_fails() {
        let value = root();
        let fields = Fields::new(&value).unwrap();
        assert!(matches!(
            fields.int("name"),
            Err(ResumeError::FieldTypeMismatch { expected: "integer", .. })
        ));
        assert!(matches!(
            fields.list("paused"),
            Err(ResumeError::FieldTypeMismatch { expected: "list", .. })
        ));
    }

    #[test]
    fn test_dict_list_reports_elements() {
        let value = root();
        let fields = Fields::new(&value).unwrap();
        let entries = fields.dict_list("unfinished").unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_ok());
        match &entries[1] {
            Err(ResumeError::FieldTypeMismatch { field, .. }) => assert_eq!(field, "unfinished[1]"),
            other => panic!("expected element mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_tiers_and_priorities() {
        let value = root();
        let fields = Fields::new(&value).unwrap();
        let tiers = fields.tiers("trackers").unwrap();
        let first = tiers[0].as_ref().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].as_ref().unwrap(), "url");
        assert!(tiers[1].is_err());

        let value = decode(b"d8:trackersll1:ade1:beee").unwrap();
        let fields = Fields::new(&value).unwrap();
        let tiers = fields.tiers("trackers").unwrap();
        let urls = tiers[0].as_ref().unwrap();
        assert!(urls[0].is_ok());
        match &urls[1] {
            Err(ResumeError::FieldTypeMismatch { field, found, .. }) => {
                assert_eq!(field, "trackers[0][1]");
                assert_eq!(*found, "dictionary");
            }
            other => panic!("expected url mismatch, got {:?}", other),
        }
        assert_eq!(fields.priorities("file_priority").unwrap(), vec![4, 0]);
    }

    #[test]
    fn test_nested_scope_in_errors() {
        let value = decode(b"d5:piece1:xe").unwrap();
        let fields = Fields::nested(value.as_dict().unwrap(), "unfinished[4]".to_string());
        match fields.int("piece") {
            Err(ResumeError::FieldTypeMismatch { field, found, .. }) => {
                assert_eq!(field, "unfinished[4].piece");
                assert_eq!(found, "byte string");
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
        assert_eq!(fields.int("adler32").unwrap(), 0);
    }

    #[test]
    fn test_policy_lookup() {
        assert_eq!(policy(b"peers6").unwrap().shape, Shape::Binary);
        assert_eq!(policy(b"trackers").unwrap().shape, Shape::Tiers);
        assert!(policy(b"qBt-category").is_none());
    }
}
