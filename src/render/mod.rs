//! Structural rendering of bencode values.
//!
//! Output is locale-agnostic: byte strings render as hex, containers render
//! as counted headers with indented children. Every threshold lives in
//! [`RenderConfig`].

use crate::bencode::BencodeValue;
use crate::resume::{policy, Shape};

/// Thresholds for the tree renderer and the text report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Indent of top-level entries
    pub base_indent: usize,
    /// Extra indent per nesting level
    pub indent_step: usize,
    /// Byte strings up to this length render in full hex
    pub hex_full_max: usize,
    /// Bytes shown in the hex preview of longer strings
    pub hex_preview_len: usize,
    /// Lists up to this length expand element by element
    pub list_expand_max: usize,
    /// Longest unlabeled top-level byte string shown as text
    pub inline_text_max: usize,
    /// Largest bitfield drawn as a piece map
    pub piece_map_max: usize,
    /// Entries shown for per-file lists
    pub file_list_max: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            base_indent: 2,
            indent_step: 4,
            hex_full_max: 32,
            hex_preview_len: 16,
            list_expand_max: 10,
            inline_text_max: 50,
            piece_map_max: 100,
            file_list_max: 10,
        }
    }
}

/// Hex form of a byte string, previewing the head of long ones
pub fn render_bytes(bytes: &[u8], config: &RenderConfig) -> String {
    if bytes.len() <= config.hex_full_max {
        format!("<bytes: {}>", hex::encode(bytes))
    } else {
        let preview = &bytes[..config.hex_preview_len.min(bytes.len())];
        format!(
            "<bytes: {} bytes, first {}: {}...>",
            bytes.len(),
            preview.len(),
            hex::encode(preview)
        )
    }
}

/// Render any value; `indent` is the column of the line holding it
pub fn render_value(value: &BencodeValue, config: &RenderConfig, indent: usize) -> String {
    let pad = " ".repeat(indent);
    let child_indent = indent + config.indent_step;

    match value {
        BencodeValue::Integer(i) => i.to_string(),
        BencodeValue::String(bytes) => render_bytes(bytes, config),
        BencodeValue::List(items) if items.is_empty() => "<list: empty>".to_string(),
        BencodeValue::List(items) if items.len() <= config.list_expand_max => {
            let mut lines = vec![format!("<list: {} items>", items.len())];
            for (i, item) in items.iter().enumerate() {
                lines.push(format!(
                    "{}  [{}]: {}",
                    pad,
                    i,
                    render_value(item, config, child_indent)
                ));
            }
            lines.join("\n")
        }
        BencodeValue::List(items) => format!("<list: {} items, not expanded>", items.len()),
        BencodeValue::Dict(dict) if dict.is_empty() => "<dict: empty>".to_string(),
        BencodeValue::Dict(dict) => {
            let mut lines = vec![format!("<dict: {} entries>", dict.len())];
            for (key, item) in dict {
                lines.push(format!(
                    "{}  {}: {}",
                    pad,
                    String::from_utf8_lossy(key),
                    render_value(item, config, child_indent)
                ));
            }
            lines.join("\n")
        }
    }
}

/// Root lists the text report prints in full before the field listing
const REPORTED_LISTS: &[&[u8]] = &[b"trackers", b"httpseeds", b"url-list", b"qBt-tags"];

fn is_printable(text: &str) -> bool {
    !text.chars().any(char::is_control)
}

/// Render one root entry, using what is known about the key
pub fn render_field(key: &[u8], value: &BencodeValue, config: &RenderConfig) -> String {
    let shape = policy(key).map(|p| p.shape);

    match value {
        BencodeValue::String(bytes) if shape == Some(Shape::Binary) => {
            render_bytes(bytes, config)
        }
        BencodeValue::String(bytes) if bytes.len() > config.inline_text_max => {
            format!("<bytes: {} bytes>", bytes.len())
        }
        BencodeValue::String(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) if is_printable(text) => text.to_string(),
            _ => format!("<bytes: {}>", hex::encode(bytes)),
        },
        BencodeValue::List(items) if REPORTED_LISTS.iter().any(|k| *k == key) => {
            format!("<list: {} items, shown above>", items.len())
        }
        other => render_value(other, config, config.base_indent),
    }
}

/// Every root entry in key order, one `key: value` block per line
pub fn render_root(root: &BencodeValue, config: &RenderConfig) -> String {
    let Some(dict) = root.as_dict() else {
        return render_value(root, config, config.base_indent);
    };

    let pad = " ".repeat(config.base_indent);
    dict.iter()
        .map(|(key, value)| {
            format!(
                "{}{}: {}",
                pad,
                String::from_utf8_lossy(key),
                render_field(key, value, config)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Draw a bitfield as `#` (set) and `.` (clear) cells, or `None` when it is
/// longer than the configured piece map
pub fn render_piece_map(bits: &[bool], config: &RenderConfig) -> Option<String> {
    (!bits.is_empty() && bits.len() <= config.piece_map_max)
        .then(|| bits.iter().map(|&b| if b { '#' } else { '.' }).collect())
}
