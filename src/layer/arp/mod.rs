//! The address resolution layer.
//!
//! Owns the neighbor cache mapping IPv4 addresses to hardware addresses
//! and the slot store parking packets that wait for a resolution.
mod endpoint;
pub mod neighbor;
pub mod pending;

pub use self::endpoint::Endpoint;
pub use self::neighbor::Cache as NeighborCache;
