use std::io::Write;

use owl_core::{ElectricityReading, MonitorSummary, PacketEvent, ReadingSink};
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFormat {
    Text,
    Json,
}

/// Writes one line per decoded reading.
pub struct ConsoleSink<W: Write> {
    out: W,
    format: LineFormat,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, format: LineFormat) -> Self {
        Self { out, format }
    }

    fn write_reading(&mut self, reading: &ElectricityReading) -> anyhow::Result<()> {
        let line = match self.format {
            LineFormat::Text => format_reading_line(reading),
            LineFormat::Json => serde_json::to_string(reading)?,
        };
        writeln!(self.out, "{line}")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> ReadingSink for ConsoleSink<W> {
    fn on_reading(&mut self, _event: &PacketEvent, reading: &ElectricityReading) {
        if let Err(err) = self.write_reading(reading) {
            tracing::error!(error = %err, "failed to write reading");
        }
    }
}

/// `<rfc3339> : electricity reading : power=...` summary of one reading.
pub fn format_reading_line(reading: &ElectricityReading) -> String {
    let timestamp = reading
        .timestamp
        .format(&Rfc3339)
        .unwrap_or_else(|_| reading.timestamp.unix_timestamp().to_string());
    let power = reading
        .channels
        .iter()
        .map(|chan| format!("{:.2}{}", chan.power, chan.power_units))
        .collect::<Vec<_>>()
        .join(",");
    let energy = reading
        .channels
        .iter()
        .map(|chan| format!("{:.2}{}", chan.energy, chan.energy_units))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "{timestamp} : electricity reading : id={} power={power} energy={energy} battery={}% rssi={} lqi={}",
        reading.id, reading.battery, reading.rssi, reading.lqi
    )
}

pub fn format_summary(summary: &MonitorSummary) -> String {
    format!(
        "received packets={} readings={} weather={} rejected={}",
        summary.packets_total, summary.readings, summary.weather_skipped, summary.rejected
    )
}
