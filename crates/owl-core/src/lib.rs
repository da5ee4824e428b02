//! Decoder for the packets broadcast by the OWL Intuition electricity monitor.
//!
//! The Intuition gateway pushes one small XML document per UDP datagram.
//! Electricity packets carry three channels of instantaneous power and
//! cumulative daily energy together with battery level and radio link
//! quality; weather packets are recognised but not decoded.
//!
//! The crate is split in the same layers as the packet path:
//! - `protocols`: pure, byte-oriented decoding (layout/reader/parser/error)
//! - `source`: datagram I/O behind the [`PacketSource`] trait
//! - `monitor`: the receive loop that decodes each packet independently and
//!   hands the outcome to a [`ReadingSink`]
//!
//! Invariants:
//! - Decoding is side-effect free and never logs; visibility is the caller's
//!   concern.
//! - A reading is either fully populated or not returned at all.
//! - Channels keep the order in which the device sent them.
//!
//! # Examples
//! ```
//! let packet = br#"<electricity id='443719005443'>
//!     <timestamp>1509950911</timestamp>
//!     <signal rssi='-68' lqi='48'/>
//!     <battery level='100%'/>
//!     <chan id='0'><curr units='w'>305.00</curr><day units='wh'>1863.39</day></chan>
//!     <chan id='1'><curr units='w'>21.00</curr><day units='wh'>3.01</day></chan>
//!     <chan id='2'><curr units='w'>270.26</curr><day units='wh'>0.00</day></chan>
//! </electricity>"#;
//!
//! let reading = owl_core::decode(packet)?;
//! assert_eq!(reading.id, "443719005443");
//! assert_eq!(reading.channels[0].power, 305.0);
//! # Ok::<(), owl_core::DecodeError>(())
//! ```

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

mod monitor;
mod protocols;
mod source;

pub use monitor::{MonitorError, MonitorSummary, ReadingSink, monitor_source};
pub use protocols::intuition::{DecodeError, decode};
pub use source::{PacketEvent, PacketSource, SourceError, UdpSource};

/// Multicast group and port the Intuition gateway broadcasts on.
pub const MULTICAST_ADDRESS: &str = "224.192.32.19:22600";
/// Default bind address for the gateway's configurable unicast push.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:41234";
/// Number of sensing channels reported by the device.
pub const CHANNEL_COUNT: usize = 3;

/// A single electricity reading from the Intuition gateway.
///
/// # Examples
/// ```
/// use owl_core::{ChannelReading, ElectricityReading};
/// use time::OffsetDateTime;
///
/// let reading = ElectricityReading {
///     id: "443719005443".to_string(),
///     timestamp: OffsetDateTime::UNIX_EPOCH,
///     rssi: -68.0,
///     lqi: 48.0,
///     battery: 100.0,
///     channels: Default::default(),
/// };
/// assert_eq!(reading.total_power(), 0.0);
/// assert_eq!(reading.channels[0], ChannelReading::default());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricityReading {
    /// Device identifier, passed through verbatim (empty when absent).
    pub id: String,
    /// Device clock at the time of the reading, in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Received signal strength reported by the gateway radio.
    pub rssi: f64,
    /// Link quality indicator reported by the gateway radio.
    pub lqi: f64,
    /// Transmitter battery level in percent.
    pub battery: f64,
    /// Channels in the order received; slot N is the Nth `chan` element.
    pub channels: [ChannelReading; CHANNEL_COUNT],
}

impl ElectricityReading {
    /// Sum of the instantaneous power across all channels.
    ///
    /// Units are not interpreted, so this is only meaningful when every
    /// channel reports the same unit (the gateway uses `w` throughout).
    pub fn total_power(&self) -> f64 {
        self.channels.iter().map(|chan| chan.power).sum()
    }
}

/// Power and energy measured on one channel.
///
/// Units are opaque strings as sent by the device (e.g. `w`, `wh`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelReading {
    /// Instantaneous power.
    pub power: f64,
    pub power_units: String,
    /// Energy used so far today.
    pub energy: f64,
    pub energy_units: String,
}
