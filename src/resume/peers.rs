use super::bits::{decode_peer_tuples, PeerTuples};
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// Packed peer address layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// 4 address bytes + 2 port bytes
    V4,
    /// 16 address bytes + 2 port bytes
    V6,
}

impl AddressFamily {
    pub fn tuple_width(self) -> usize {
        match self {
            AddressFamily::V4 => 6,
            AddressFamily::V6 => 18,
        }
    }
}

/// Parse one compact tuple (address followed by big-endian port)
pub fn from_compact(data: &[u8], family: AddressFamily) -> Option<SocketAddr> {
    if data.len() != family.tuple_width() {
        return None;
    }

    let (addr, port) = data.split_at(data.len() - 2);
    let ip = match family {
        AddressFamily::V4 => {
            let octets: [u8; 4] = addr.try_into().ok()?;
            IpAddr::V4(Ipv4Addr::from(octets))
        }
        AddressFamily::V6 => {
            let octets: [u8; 16] = addr.try_into().ok()?;
            IpAddr::V6(Ipv6Addr::from(octets))
        }
    };
    let port = u16::from_be_bytes([port[0], port[1]]);

    Some(SocketAddr::new(ip, port))
}

/// Decoded packed peer buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerList {
    pub family: AddressFamily,
    #[serde(flatten)]
    pub tuples: PeerTuples,
    pub endpoints: Vec<SocketAddr>,
}

impl PeerList {
    /// Whole tuples are parsed; trailing partial bytes are only counted
    pub fn from_compact_list(data: &[u8], family: AddressFamily) -> Self {
        let tuples = decode_peer_tuples(data, family.tuple_width());
        let endpoints = data
            .chunks_exact(family.tuple_width())
            .filter_map(|chunk| from_compact(chunk, family))
            .collect();

        Self {
            family,
            tuples,
            endpoints,
        }
    }

    pub fn len(&self) -> usize {
        self.tuples.count
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.count == 0
    }
}
