//! A minimal, single-interface IPv4 network stack.
//!
//! `nanonet` implements the packet-processing pipeline of one host on one
//! link: Ethernet framing, ARP address resolution with a pending-packet
//! slot, IP header validation and outgoing fragmentation, ICMP echo and
//! unreachable messages, and UDP datagram delivery through a port-handler
//! table.
//!
//! The crate is organized in the classic split between *representation* and
//! *behaviour*:
//!
//! * [`wire`] parses and builds untrusted packet bytes. Nothing in there
//!   mutates stack state.
//! * [`layer`] contains one endpoint per protocol, each owning exactly the
//!   state that protocol needs (the neighbor cache, the pending slots, the
//!   port table).
//! * [`storage`] provides the packet buffer all layers share: a fixed
//!   allocation with two cursors so headers can be prepended and stripped
//!   in place without copying payloads around.
//! * [`nic`] abstracts the physical device as raw frame transmit/receive.
//! * [`iface`] ties everything together into an [`iface::Interface`], the
//!   explicit stack context that replaces process-wide tables. All
//!   processing is single-threaded and run-to-completion; one call to
//!   [`iface::Interface::poll`] receives at most one frame and finishes
//!   handling it, replies included, before returning.
//!
//! There is no routing between interfaces, no inbound fragment reassembly,
//! no TCP and no IPv6. Timeouts (neighbor entries, pending packets) are
//! evaluated lazily from the timestamps the caller passes in; the stack
//! never consults a clock of its own.
#![warn(unreachable_pub)]

#[macro_use] mod macros;

pub mod iface;
pub mod layer;
pub mod nic;
pub mod storage;
pub mod time;
pub mod wire;
