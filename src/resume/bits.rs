use serde::Serialize;

/// Expand a bitfield into one bool per unit, most significant bit first.
///
/// With `expected` set the result is cut to that many entries, dropping the
/// padding bits of the last byte.
pub fn decode_bitfield(bitfield: &[u8], expected: Option<usize>) -> Vec<bool> {
    let mut bits: Vec<bool> = bitfield
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1 == 1))
        .collect();

    if let Some(count) = expected {
        bits.truncate(count);
    }

    bits
}

/// Completed / total counts over a bit sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Completion {
    pub completed: usize,
    pub total: usize,
    pub percentage: f64,
}

impl Completion {
    pub fn remaining_percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 - self.percentage
        }
    }
}

pub fn analyze_completion(bits: &[bool]) -> Completion {
    let completed = bits.iter().filter(|&&b| b).count();
    let total = bits.len();
    let percentage = if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    };

    Completion {
        completed,
        total,
        percentage,
    }
}

/// Result of splitting a packed buffer into fixed-width tuples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeerTuples {
    pub count: usize,
    /// Bytes left over after the last whole tuple; nonzero means malformed
    pub remainder: usize,
}

impl PeerTuples {
    pub fn is_malformed(&self) -> bool {
        self.remainder != 0
    }
}

pub fn decode_peer_tuples(data: &[u8], tuple_width: usize) -> PeerTuples {
    if tuple_width == 0 {
        return PeerTuples {
            count: 0,
            remainder: data.len(),
        };
    }

    PeerTuples {
        count: data.len() / tuple_width,
        remainder: data.len() % tuple_width,
    }
}
