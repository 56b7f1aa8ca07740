//! Discovery endpoints
//!
//! Boot node and beacon setup addresses are kept as `"<ip>:<port>"` strings,
//! the form nodes consume them in.

use std::net::{IpAddr, SocketAddr};

/// Render an endpoint. IPv6 addresses are bracketed.
pub fn format_endpoint(ip: IpAddr, port: u16) -> String {
    SocketAddr::new(ip, port).to_string()
}

/// Parse an endpoint back to a socket address
pub fn parse_endpoint(endpoint: &str) -> Option<SocketAddr> {
    endpoint.parse().ok()
}

/// IP portion of an endpoint
pub fn endpoint_ip(endpoint: &str) -> Option<IpAddr> {
    parse_endpoint(endpoint).map(|addr| addr.ip())
}
