//! The datagram layer.
mod endpoint;

pub use self::endpoint::{Endpoint, Handler};
