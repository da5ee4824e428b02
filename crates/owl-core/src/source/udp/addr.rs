use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, ToSocketAddrs};

use super::error::UdpSourceError;

/// Resolve a bind address, accepting the `:port` shorthand for all interfaces.
///
/// # Examples
/// This helper is part of an internal module, so the example is marked as
/// text example.
/// ```text
/// use owl_core::source::udp::addr::resolve_bind_addr;
///
/// let addr = resolve_bind_addr(":41234").unwrap();
/// assert_eq!(addr.to_string(), "0.0.0.0:41234");
/// ```
///
/// # Errors
/// Returns `UdpSourceError::Address` when the input does not resolve.
pub fn resolve_bind_addr(input: &str) -> Result<SocketAddr, UdpSourceError> {
    let trimmed = input.trim();
    let candidate = if trimmed.starts_with(':') {
        format!("0.0.0.0{trimmed}")
    } else {
        trimmed.to_string()
    };
    candidate
        .to_socket_addrs()
        .map_err(|err| address_error(input, err.to_string()))?
        .next()
        .ok_or_else(|| address_error(input, "no address resolved".to_string()))
}

/// Parse an IPv4 multicast `group:port` pair.
///
/// # Errors
/// Returns `UdpSourceError::Address` when the input is not an IPv4 socket
/// address or the IP is not a multicast group.
pub fn parse_multicast_group(input: &str) -> Result<SocketAddrV4, UdpSourceError> {
    let addr: SocketAddrV4 = input
        .trim()
        .parse()
        .map_err(|err: std::net::AddrParseError| address_error(input, err.to_string()))?;
    if !addr.ip().is_multicast() {
        return Err(address_error(input, "not a multicast group".to_string()));
    }
    Ok(addr)
}

/// Wildcard bind address for a multicast group's port.
pub fn multicast_bind_addr(group: SocketAddrV4) -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, group.port()))
}

fn address_error(input: &str, message: String) -> UdpSourceError {
    UdpSourceError::Address {
        input: input.to_string(),
        message,
    }
}
