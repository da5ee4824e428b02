use std::net::SocketAddr;

use anyhow::{Context, Result};
use metrics::{Unit, counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use owl_core::{DecodeError, ElectricityReading, PacketEvent, ReadingSink};

/// Publishes readings as Prometheus metrics.
pub struct PrometheusSink;

impl PrometheusSink {
    /// Install the global recorder and serve `/metrics` on `bind_addr`.
    pub fn install(bind_addr: &str) -> Result<Self> {
        let addr = parse_metrics_addr(bind_addr)?;
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .with_context(|| format!("failed to start metrics listener on {addr}"))?;
        tracing::info!(addr = %addr, "serving Prometheus metrics");
        Ok(Self::new())
    }

    pub fn new() -> Self {
        describe_counter!("owl_readings_total", "Electricity readings decoded");
        describe_counter!(
            "owl_packets_skipped_total",
            "Recognised packets that are not decoded"
        );
        describe_counter!("owl_decode_errors_total", "Packets rejected by the decoder");
        describe_gauge!("owl_channel_power", "Instantaneous power per channel");
        describe_gauge!("owl_channel_energy_day", "Energy used today per channel");
        describe_gauge!(
            "owl_battery_level_percent",
            Unit::Percent,
            "Transmitter battery level"
        );
        describe_gauge!("owl_signal_rssi", "Received signal strength");
        describe_gauge!("owl_signal_lqi", "Link quality indicator");
        Self
    }
}

impl Default for PrometheusSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingSink for PrometheusSink {
    fn on_reading(&mut self, _event: &PacketEvent, reading: &ElectricityReading) {
        counter!("owl_readings_total").increment(1);
        for (index, chan) in reading.channels.iter().enumerate() {
            let channel = index.to_string();
            gauge!(
                "owl_channel_power",
                "channel" => channel.clone(),
                "units" => chan.power_units.clone()
            )
            .set(chan.power);
            gauge!(
                "owl_channel_energy_day",
                "channel" => channel,
                "units" => chan.energy_units.clone()
            )
            .set(chan.energy);
        }
        gauge!("owl_battery_level_percent").set(reading.battery);
        gauge!("owl_signal_rssi").set(reading.rssi);
        gauge!("owl_signal_lqi").set(reading.lqi);
    }

    fn on_weather(&mut self, _event: &PacketEvent) {
        counter!("owl_packets_skipped_total", "kind" => "weather").increment(1);
    }

    fn on_rejected(&mut self, _event: &PacketEvent, err: &DecodeError) {
        counter!("owl_decode_errors_total", "kind" => err.kind()).increment(1);
    }
}

fn parse_metrics_addr(input: &str) -> Result<SocketAddr> {
    let trimmed = input.trim();
    let candidate = if trimmed.starts_with(':') {
        format!("0.0.0.0{trimmed}")
    } else {
        trimmed.to_string()
    };
    candidate
        .parse()
        .with_context(|| format!("invalid metrics address '{input}'"))
}
