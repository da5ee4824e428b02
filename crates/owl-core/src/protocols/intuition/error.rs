use thiserror::Error;

/// Errors returned by [`decode`](super::decode).
///
/// Variants are mutually exclusive; the first failing check wins in
/// declaration order.
///
/// # Examples
/// ```
/// use owl_core::DecodeError;
///
/// let err = DecodeError::UnexpectedChannelCount { count: 1 };
/// assert_eq!(err.to_string(), "expected 3 channels, received 1");
/// assert_eq!(err.kind(), "channel_count");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Bytes are not well-formed XML, or the root element is unknown.
    #[error("unable to decode packet")]
    MalformedPacket,
    /// A weather packet; recognised but intentionally not decoded.
    #[error("weather packets are not decoded")]
    WeatherPacket,
    #[error("unexpected value for battery level: got {level}, want <float>%")]
    InvalidBatteryFormat { level: String },
    #[error("expected 3 channels, received {count}")]
    UnexpectedChannelCount { count: usize },
}

impl DecodeError {
    /// Stable short label, suitable for metric labels and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            DecodeError::MalformedPacket => "malformed",
            DecodeError::WeatherPacket => "weather",
            DecodeError::InvalidBatteryFormat { .. } => "invalid_battery",
            DecodeError::UnexpectedChannelCount { .. } => "channel_count",
        }
    }

    /// Weather packets are a signal to skip, not a decode failure.
    pub fn is_weather(&self) -> bool {
        matches!(self, DecodeError::WeatherPacket)
    }
}
