mod udp;

pub use udp::UdpSource;

use std::net::SocketAddr;

use thiserror::Error;
use time::OffsetDateTime;

/// One received datagram, owned so decoding never borrows the socket buffer.
#[derive(Debug, Clone)]
pub struct PacketEvent {
    /// Local receive time.
    pub received_at: OffsetDateTime,
    /// Sender address, when the transport knows it.
    pub peer: Option<SocketAddr>,
    pub data: Vec<u8>,
}

/// A provider of raw packets, one candidate packet per call.
///
/// `Ok(None)` means the source is exhausted.
pub trait PacketSource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid address: {0}")]
    Address(String),
}

impl From<udp::error::UdpSourceError> for SourceError {
    fn from(value: udp::error::UdpSourceError) -> Self {
        match value {
            udp::error::UdpSourceError::Address { input, message } => {
                SourceError::Address(format!("{input}: {message}"))
            }
        }
    }
}
