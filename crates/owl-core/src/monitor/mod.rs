use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode;
use crate::source::{PacketSource, SourceError};

mod sink;

pub use sink::ReadingSink;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Packet counts for one monitoring run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSummary {
    pub packets_total: u64,
    pub readings: u64,
    pub weather_skipped: u64,
    pub rejected: u64,
}

/// Decode packets from `source` until it is exhausted or `limit` packets
/// have been received, dispatching each outcome to `sink`.
///
/// Every packet is decoded independently: weather packets and decode
/// failures are counted and reported but never stop the loop. Only source
/// errors end it early.
pub fn monitor_source<S, K>(
    source: &mut S,
    sink: &mut K,
    limit: Option<u64>,
) -> Result<MonitorSummary, MonitorError>
where
    S: PacketSource,
    K: ReadingSink,
{
    let mut summary = MonitorSummary::default();

    while limit.is_none_or(|max| summary.packets_total < max) {
        let Some(event) = source.next_packet()? else {
            break;
        };
        summary.packets_total += 1;

        match decode(&event.data) {
            Ok(reading) => {
                summary.readings += 1;
                sink.on_reading(&event, &reading);
            }
            Err(err) if err.is_weather() => {
                summary.weather_skipped += 1;
                tracing::debug!(peer = ?event.peer, "weather packet skipped");
                sink.on_weather(&event);
            }
            Err(err) => {
                summary.rejected += 1;
                tracing::warn!(
                    peer = ?event.peer,
                    kind = err.kind(),
                    error = %err,
                    "rejected packet"
                );
                sink.on_rejected(&event, &err);
            }
        }
    }

    Ok(summary)
}
