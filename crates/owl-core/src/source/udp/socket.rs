use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use time::OffsetDateTime;

use crate::source::{PacketEvent, PacketSource, SourceError};

use super::addr::{multicast_bind_addr, parse_multicast_group, resolve_bind_addr};
use super::layout;

/// Blocking UDP packet source.
///
/// Each call to [`PacketSource::next_packet`] waits for one datagram and
/// returns it as an owned [`PacketEvent`].
pub struct UdpSource {
    socket: UdpSocket,
    buf: Vec<u8>,
}

impl UdpSource {
    /// Bind a unicast listener, e.g. `"0.0.0.0:41234"` or `":41234"`.
    pub fn bind(addr: &str) -> Result<Self, SourceError> {
        let addr = resolve_bind_addr(addr)?;
        let socket = UdpSocket::bind(addr)?;
        tracing::debug!(local_addr = %addr, "UDP socket bound");
        Ok(Self::from_socket(socket))
    }

    /// Bind the group's port on all interfaces and join the multicast group,
    /// e.g. [`MULTICAST_ADDRESS`](crate::MULTICAST_ADDRESS).
    pub fn join_multicast(group: &str) -> Result<Self, SourceError> {
        let group = parse_multicast_group(group)?;
        let socket = UdpSocket::bind(multicast_bind_addr(group))?;
        socket.join_multicast_v4(group.ip(), &Ipv4Addr::UNSPECIFIED)?;
        tracing::debug!(group = %group, "joined multicast group");
        Ok(Self::from_socket(socket))
    }

    pub fn from_socket(socket: UdpSocket) -> Self {
        Self {
            socket,
            buf: vec![0u8; layout::RECV_BUFFER_SIZE],
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr, SourceError> {
        Ok(self.socket.local_addr()?)
    }

    /// Limit how long `next_packet` blocks; `None` waits forever.
    ///
    /// A timed-out read surfaces as `SourceError::Io` with kind `WouldBlock`
    /// or `TimedOut`, depending on the platform.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), SourceError> {
        Ok(self.socket.set_read_timeout(timeout)?)
    }
}

impl PacketSource for UdpSource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError> {
        let (len, peer) = self.socket.recv_from(&mut self.buf)?;
        tracing::trace!(peer = %peer, bytes = len, "received datagram");
        Ok(Some(PacketEvent {
            received_at: OffsetDateTime::now_utc(),
            peer: Some(peer),
            data: self.buf[..len].to_vec(),
        }))
    }
}
