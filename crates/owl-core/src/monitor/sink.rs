use crate::source::PacketEvent;
use crate::{DecodeError, ElectricityReading};

/// Consumer of decode outcomes, called once per received packet.
///
/// Only `on_reading` is required; weather and rejected packets are ignored
/// unless a sink opts in.
pub trait ReadingSink {
    fn on_reading(&mut self, event: &PacketEvent, reading: &ElectricityReading);

    fn on_weather(&mut self, _event: &PacketEvent) {}

    fn on_rejected(&mut self, _event: &PacketEvent, _err: &DecodeError) {}
}

/// Collects every decoded reading.
impl ReadingSink for Vec<ElectricityReading> {
    fn on_reading(&mut self, _event: &PacketEvent, reading: &ElectricityReading) {
        self.push(reading.clone());
    }
}

impl<S: ReadingSink> ReadingSink for Option<S> {
    fn on_reading(&mut self, event: &PacketEvent, reading: &ElectricityReading) {
        if let Some(sink) = self {
            sink.on_reading(event, reading);
        }
    }

    fn on_weather(&mut self, event: &PacketEvent) {
        if let Some(sink) = self {
            sink.on_weather(event);
        }
    }

    fn on_rejected(&mut self, event: &PacketEvent, err: &DecodeError) {
        if let Some(sink) = self {
            sink.on_rejected(event, err);
        }
    }
}

impl<A: ReadingSink, B: ReadingSink> ReadingSink for (A, B) {
    fn on_reading(&mut self, event: &PacketEvent, reading: &ElectricityReading) {
        self.0.on_reading(event, reading);
        self.1.on_reading(event, reading);
    }

    fn on_weather(&mut self, event: &PacketEvent) {
        self.0.on_weather(event);
        self.1.on_weather(event);
    }

    fn on_rejected(&mut self, event: &PacketEvent, err: &DecodeError) {
        self.0.on_rejected(event, err);
        self.1.on_rejected(event, err);
    }
}
