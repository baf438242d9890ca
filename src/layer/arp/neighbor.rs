//! The cache of resolved neighbors.
use crate::time::{Duration, Expiration, Instant};
use crate::wire::{EthernetAddress, Ipv4Address};

/// How long a learned mapping stays valid without being refreshed.
pub const ENTRY_LIFETIME: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct Neighbor {
    protocol_addr: Ipv4Address,
    hardware_addr: EthernetAddress,
    expires_at: Expiration,
}

/// A mapping from protocol addresses to hardware addresses.
///
/// At most one hardware address per protocol address; a later fill
/// overwrites an earlier one. Entries are never evicted actively, only
/// ignored once their expiry has passed the lookup timestamp.
#[derive(Debug, Default)]
pub struct Cache {
    entries: Vec<Neighbor>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn or refresh a mapping at `now`.
    pub fn fill(&mut self, protocol_addr: Ipv4Address, hardware_addr: EthernetAddress, now: Instant) {
        let expires_at = Expiration::When(now + ENTRY_LIFETIME);
        match self.lookup_index(protocol_addr) {
            Ok(index) => {
                let entry = &mut self.entries[index];
                entry.hardware_addr = hardware_addr;
                entry.expires_at = expires_at;
            }
            Err(index) => self.entries.insert(index, Neighbor {
                protocol_addr,
                hardware_addr,
                expires_at,
            }),
        }
    }

    /// Look up a mapping that has not expired at `now`.
    pub fn lookup(&self, protocol_addr: Ipv4Address, now: Instant) -> Option<EthernetAddress> {
        match self.lookup_index(protocol_addr) {
            Ok(index) => {
                let entry = &self.entries[index];
                if entry.expires_at.is_expired(now) {
                    None
                } else {
                    Some(entry.hardware_addr)
                }
            }
            Err(_) => None,
        }
    }

    fn lookup_index(&self, protocol_addr: Ipv4Address) -> Result<usize, usize> {
        self.entries.binary_search_by_key(&protocol_addr, |entry| entry.protocol_addr)
    }
}
