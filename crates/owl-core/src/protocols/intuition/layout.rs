pub const ELECTRICITY_ROOT: &str = "electricity";
pub const WEATHER_ROOT: &str = "weather";

pub const ID_ATTR: &str = "id";

pub const TIMESTAMP_ELEMENT: &str = "timestamp";

pub const SIGNAL_ELEMENT: &str = "signal";
pub const RSSI_ATTR: &str = "rssi";
pub const LQI_ATTR: &str = "lqi";

pub const BATTERY_ELEMENT: &str = "battery";
pub const LEVEL_ATTR: &str = "level";
pub const PERCENT_SIGN: char = '%';

pub const CHANNEL_ELEMENT: &str = "chan";
pub const POWER_ELEMENT: &str = "curr";
pub const ENERGY_ELEMENT: &str = "day";
pub const UNITS_ATTR: &str = "units";

/// Placeholder URI bound to namespace prefixes a packet uses without
/// declaring them.
pub const UNDECLARED_NAMESPACE: &str = "urn:owl:undeclared";
pub const MAX_UNDECLARED_PREFIXES: usize = 8;
