//! UDP datagram source.
//!
//! The gateway either multicasts to a well-known group or pushes unicast
//! datagrams to a configured host. Both arrive as one XML document per
//! datagram; this module only moves bytes and leaves decoding to the caller.

pub mod addr;
pub mod error;
pub mod layout;
pub mod socket;

pub use socket::UdpSource;
