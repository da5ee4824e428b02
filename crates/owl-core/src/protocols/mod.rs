//! Protocol decoding modules.
//!
//! Each protocol follows a layered structure:
//! - `layout`: element and attribute names (source of truth)
//! - `reader`: safe tree access and value conventions
//! - `parser`: domain-level decoding (no direct tree walking)
//! - `error`: explicit, actionable errors
//!
//! Parsers are pure and contain no I/O or logging; sources and the monitor
//! loop handle sockets and reporting.

pub(crate) mod common;
pub mod intuition;
