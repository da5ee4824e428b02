use std::ops::RangeInclusive;

use time::OffsetDateTime;

use super::error::DecodeError;
use super::layout;
use super::reader::{IntuitionReader, packet_text, parse_battery_level, parse_document};
use crate::{CHANNEL_COUNT, ChannelReading, ElectricityReading};

/// Years a reading timestamp can take and still be written out as RFC 3339.
const RFC3339_YEARS: RangeInclusive<i32> = 0..=9999;

#[derive(Debug, PartialEq, Eq)]
enum PacketKind {
    Electricity,
    Weather,
    Unknown,
}

fn classify(root_name: &str) -> PacketKind {
    match root_name {
        layout::ELECTRICITY_ROOT => PacketKind::Electricity,
        layout::WEATHER_ROOT => PacketKind::Weather,
        _ => PacketKind::Unknown,
    }
}

/// Fields of an electricity packet before invariant checks.
struct ElectricityPacket<'a> {
    id: String,
    timestamp: OffsetDateTime,
    rssi: f64,
    lqi: f64,
    battery_level: &'a str,
    channels: Vec<ChannelReading>,
}

/// Decode one datagram from the Intuition gateway.
///
/// # Errors
/// - `MalformedPacket` when the bytes are not XML, the root element is
///   neither `electricity` nor `weather`, or a numeric field does not parse.
/// - `WeatherPacket` for weather packets, which are not decoded.
/// - `InvalidBatteryFormat` when the battery level is not `<float>%`.
/// - `UnexpectedChannelCount` unless exactly three `chan` elements are present.
pub fn decode(packet: &[u8]) -> Result<ElectricityReading, DecodeError> {
    let text = packet_text(packet)?;
    let document = parse_document(&text)?;
    let root = IntuitionReader::new(document.root_element());

    match classify(root.name()) {
        PacketKind::Electricity => {
            let fields = read_electricity(&root)?;
            build_reading(fields)
        }
        PacketKind::Weather => Err(DecodeError::WeatherPacket),
        PacketKind::Unknown => Err(DecodeError::MalformedPacket),
    }
}

fn read_electricity<'a>(
    root: &IntuitionReader<'a, '_>,
) -> Result<ElectricityPacket<'a>, DecodeError> {
    let seconds = root.child(layout::TIMESTAMP_ELEMENT).text_i64()?;
    let timestamp = OffsetDateTime::from_unix_timestamp(seconds)
        .ok()
        .filter(|timestamp| RFC3339_YEARS.contains(&timestamp.year()))
        .ok_or(DecodeError::MalformedPacket)?;

    let signal = root.child(layout::SIGNAL_ELEMENT);
    let rssi = signal.attr_f64(layout::RSSI_ATTR)?;
    let lqi = signal.attr_f64(layout::LQI_ATTR)?;

    let battery_level = root
        .child(layout::BATTERY_ELEMENT)
        .attr(layout::LEVEL_ATTR)
        .unwrap_or_default();

    let channels = root
        .children(layout::CHANNEL_ELEMENT)
        .iter()
        .map(read_channel)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ElectricityPacket {
        id: root.attr_str(layout::ID_ATTR),
        timestamp,
        rssi,
        lqi,
        battery_level,
        channels,
    })
}

fn read_channel(chan: &IntuitionReader<'_, '_>) -> Result<ChannelReading, DecodeError> {
    let power = chan.child(layout::POWER_ELEMENT);
    let energy = chan.child(layout::ENERGY_ELEMENT);
    Ok(ChannelReading {
        power: power.text_f64()?,
        power_units: power.attr_str(layout::UNITS_ATTR),
        energy: energy.text_f64()?,
        energy_units: energy.attr_str(layout::UNITS_ATTR),
    })
}

fn build_reading(packet: ElectricityPacket<'_>) -> Result<ElectricityReading, DecodeError> {
    let battery = parse_battery_level(packet.battery_level)?;

    let count = packet.channels.len();
    let channels: [ChannelReading; CHANNEL_COUNT] = packet
        .channels
        .try_into()
        .map_err(|_| DecodeError::UnexpectedChannelCount { count })?;

    Ok(ElectricityReading {
        id: packet.id,
        timestamp: packet.timestamp,
        rssi: packet.rssi,
        lqi: packet.lqi,
        battery,
        channels,
    })
}

#[cfg(test)]
mod tests {
    use super::{PacketKind, classify, decode};
    use crate::protocols::intuition::error::DecodeError;
    use time::OffsetDateTime;

    const ELEC: &[u8] = b"<electricity id='443719005443'><timestamp>1509950911</timestamp><signal rssi='-68' lqi='48'/><battery level='100%'/><chan id='0'><curr units='w'>305.00</curr><day units='wh'>1863.39</day></chan><chan id='1'><curr units='w'>21.00</curr><day units='wh'>3.01</day></chan><chan id='2'><curr units='w'>270.26</curr><day units='wh'>0.00</day></chan></electricity>";

    fn electricity_with(battery: &str, channels: usize) -> Vec<u8> {
        let mut packet = format!(
            "<electricity id='1'><timestamp>1509950911</timestamp><signal rssi='-68' lqi='48'/><battery level='{battery}'/>"
        );
        for id in 0..channels {
            packet.push_str(&format!(
                "<chan id='{id}'><curr units='w'>{id}.50</curr><day units='wh'>1.00</day></chan>"
            ));
        }
        packet.push_str("</electricity>");
        packet.into_bytes()
    }

    #[test]
    fn classify_root_names() {
        assert_eq!(classify("electricity"), PacketKind::Electricity);
        assert_eq!(classify("weather"), PacketKind::Weather);
        assert_eq!(classify("Electricity"), PacketKind::Unknown);
        assert_eq!(classify(""), PacketKind::Unknown);
    }

    #[test]
    fn decode_valid_electricity() {
        let reading = decode(ELEC).unwrap();
        assert_eq!(reading.id, "443719005443");
        assert_eq!(
            reading.timestamp,
            OffsetDateTime::from_unix_timestamp(1_509_950_911).unwrap()
        );
        assert_eq!(reading.rssi, -68.0);
        assert_eq!(reading.lqi, 48.0);
        assert_eq!(reading.battery, 100.0);
        assert_eq!(reading.channels[0].power, 305.0);
        assert_eq!(reading.channels[0].power_units, "w");
        assert_eq!(reading.channels[0].energy, 1863.39);
        assert_eq!(reading.channels[0].energy_units, "wh");
        assert_eq!(reading.channels[1].power, 21.0);
        assert_eq!(reading.channels[1].energy, 3.01);
        assert_eq!(reading.channels[2].power, 270.26);
        assert_eq!(reading.channels[2].energy, 0.0);
    }

    #[test]
    fn decode_is_repeatable() {
        assert_eq!(decode(ELEC), decode(ELEC));
    }

    #[test]
    fn decode_garbage() {
        let err = decode("asjfd中文可以吗😂".as_bytes()).unwrap_err();
        assert_eq!(err, DecodeError::MalformedPacket);
    }

    #[test]
    fn decode_empty_input() {
        assert_eq!(decode(b"").unwrap_err(), DecodeError::MalformedPacket);
    }

    #[test]
    fn decode_unknown_root() {
        let err = decode(b"<codequality id='1'><text>Poor/Sunny</text></codequality>").unwrap_err();
        assert_eq!(err, DecodeError::MalformedPacket);
    }

    #[test]
    fn decode_weather() {
        let err = decode(b"<weather id='1' code='113'><temperature>9.00</temperature></weather>")
            .unwrap_err();
        assert_eq!(err, DecodeError::WeatherPacket);
    }

    #[test]
    fn decode_single_channel() {
        let err = decode(&electricity_with("80%", 1)).unwrap_err();
        assert_eq!(err, DecodeError::UnexpectedChannelCount { count: 1 });
    }

    #[test]
    fn decode_four_channels() {
        let err = decode(&electricity_with("80%", 4)).unwrap_err();
        assert_eq!(err, DecodeError::UnexpectedChannelCount { count: 4 });
    }

    #[test]
    fn decode_invalid_battery() {
        let err = decode(&electricity_with("high", 3)).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidBatteryFormat {
                level: "high".to_string()
            }
        );
    }

    #[test]
    fn battery_checked_before_channel_count() {
        let err = decode(&electricity_with("x%", 1)).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidBatteryFormat { .. }));
    }

    #[test]
    fn missing_battery_is_invalid_format() {
        let packet = b"<electricity id='1'><chan/><chan/><chan/></electricity>";
        let err = decode(packet).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidBatteryFormat {
                level: String::new()
            }
        );
    }

    #[test]
    fn non_numeric_timestamp_is_malformed() {
        let packet = String::from_utf8(electricity_with("80%", 3))
            .unwrap()
            .replace("1509950911", "yesterday");
        let err = decode(packet.as_bytes()).unwrap_err();
        assert_eq!(err, DecodeError::MalformedPacket);
    }

    #[test]
    fn out_of_range_timestamp_is_malformed() {
        let packet = String::from_utf8(electricity_with("80%", 3))
            .unwrap()
            .replace("1509950911", "9223372036854775807");
        assert_eq!(decode(packet.as_bytes()).unwrap_err(), DecodeError::MalformedPacket);
    }

    #[test]
    fn negative_year_timestamp_is_malformed() {
        let packet = String::from_utf8(electricity_with("80%", 3))
            .unwrap()
            .replace("1509950911", "-62167219201");
        assert_eq!(decode(packet.as_bytes()).unwrap_err(), DecodeError::MalformedPacket);
    }

    #[test]
    fn timestamp_past_year_9999_is_malformed() {
        let packet = String::from_utf8(electricity_with("80%", 3))
            .unwrap()
            .replace("1509950911", "253402300800");
        assert_eq!(decode(packet.as_bytes()).unwrap_err(), DecodeError::MalformedPacket);
    }

    #[test]
    fn boundary_year_timestamps_serialize() {
        for (seconds, rendered) in [
            ("-62167219200", "0000-01-01T00:00:00Z"),
            ("253402300799", "9999-12-31T23:59:59Z"),
        ] {
            let packet = String::from_utf8(electricity_with("80%", 3))
                .unwrap()
                .replace("1509950911", seconds);
            let reading = decode(packet.as_bytes()).unwrap();
            let value = serde_json::to_value(&reading).expect("reading json");
            assert_eq!(value["timestamp"], rendered);
        }
    }

    #[test]
    fn undeclared_namespace_prefix_is_ignored() {
        let packet = String::from_utf8(ELEC.to_vec())
            .unwrap()
            .replace("<", "<owl:")
            .replace("<owl:/", "</owl:");
        let reading = decode(packet.as_bytes()).unwrap();
        assert_eq!(reading, decode(ELEC).unwrap());
    }

    #[test]
    fn channel_text_split_by_comment_is_joined() {
        let packet = String::from_utf8(ELEC.to_vec())
            .unwrap()
            .replace(">305.00<", ">305<!-- split -->.5<");
        let reading = decode(packet.as_bytes()).unwrap();
        assert_eq!(reading.channels[0].power, 305.5);
    }

    #[test]
    fn missing_optional_fields_default_to_zero() {
        let packet = b"<electricity><battery level='50%'/><chan/><chan/><chan/></electricity>";
        let reading = decode(packet).unwrap();
        assert_eq!(reading.id, "");
        assert_eq!(reading.timestamp, OffsetDateTime::UNIX_EPOCH);
        assert_eq!(reading.rssi, 0.0);
        assert_eq!(reading.battery, 50.0);
        assert_eq!(reading.channels[2].power_units, "");
    }

    #[test]
    fn channels_keep_document_order() {
        let packet = String::from_utf8(electricity_with("80%", 3))
            .unwrap()
            .replace("chan id='0'", "chan id='2'")
            .replace("chan id='2'><curr units='w'>2.50", "chan id='0'><curr units='w'>2.50");
        let reading = decode(packet.as_bytes()).unwrap();
        assert_eq!(reading.channels[0].power, 0.5);
        assert_eq!(reading.channels[2].power, 2.5);
    }

    #[test]
    fn non_numeric_channel_value_is_malformed() {
        let packet = String::from_utf8(electricity_with("80%", 3))
            .unwrap()
            .replace(">1.50<", ">n/a<");
        assert_eq!(decode(packet.as_bytes()).unwrap_err(), DecodeError::MalformedPacket);
    }
}
