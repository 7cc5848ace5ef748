//! IP Literal Validation

use std::net::IpAddr;

/// Whether `token` is an IPv4 dotted quad or an IPv6 literal.
///
/// Hostnames, bracketed addresses, `addr:port` pairs and the empty string are
/// all rejected.
pub fn is_ip(token: &str) -> bool {
    token.parse::<IpAddr>().is_ok()
}
