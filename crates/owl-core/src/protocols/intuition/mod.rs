//! OWL Intuition packet decoding.
//!
//! The gateway sends one XML document per datagram. The root element name
//! selects the packet kind: `electricity` packets are decoded into an
//! [`ElectricityReading`](crate::ElectricityReading), `weather` packets are
//! recognised and rejected with [`DecodeError::WeatherPacket`], anything else
//! is malformed.
//!
//! Electricity packets must carry exactly three `chan` elements and a
//! battery level of the form `<float>%`. Channels are mapped by position;
//! their `id` attributes are not used for ordering.
//!
//! Element and attribute names live in `layout`; tree access and numeric
//! conventions live in `reader`.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use error::DecodeError;
pub use parser::decode;
