//! Packets parked while their destination resolves.
use crate::storage::PacketBuffer;
use crate::time::{Duration, Instant};
use crate::wire::Ipv4Address;

/// How long a parked packet waits before its slot can be reclaimed.
///
/// The expiry doubles as the minimum interval between requests for the
/// same destination: a new request goes out only when parking succeeds.
pub const PENDING_LIFETIME: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Slot {
    dst_addr: Ipv4Address,
    packet: PacketBuffer,
    expires_at: Instant,
}

/// One parked packet per unresolved destination.
///
/// The store is deliberately lossy: while a live slot waits on a
/// destination, further packets to it are refused and the caller drops
/// them. Retransmission is the business of whoever sits above UDP.
#[derive(Debug, Default)]
pub struct Slots {
    slots: Vec<Slot>,
}

impl Slots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park `packet` until `dst_addr` resolves.
    ///
    /// Returns `false`, refusing the packet, when a live slot already
    /// waits on the same destination. An expired slot is reclaimed.
    pub fn park(&mut self, dst_addr: Ipv4Address, packet: PacketBuffer, now: Instant) -> bool {
        let expires_at = now + PENDING_LIFETIME;
        match self.lookup_index(dst_addr) {
            Ok(index) => {
                let slot = &mut self.slots[index];
                if now < slot.expires_at {
                    return false;
                }
                slot.packet = packet;
                slot.expires_at = expires_at;
                true
            }
            Err(index) => {
                self.slots.insert(index, Slot { dst_addr, packet, expires_at });
                true
            }
        }
    }

    /// Take the packet waiting on `dst_addr`, if one is still live.
    pub fn take(&mut self, dst_addr: Ipv4Address, now: Instant) -> Option<PacketBuffer> {
        match self.lookup_index(dst_addr) {
            Ok(index) => {
                let slot = self.slots.remove(index);
                if now < slot.expires_at {
                    Some(slot.packet)
                } else {
                    None
                }
            }
            Err(_) => None,
        }
    }

    fn lookup_index(&self, dst_addr: Ipv4Address) -> Result<usize, usize> {
        self.slots.binary_search_by_key(&dst_addr, |slot| slot.dst_addr)
    }
}
