//! Resolved Remote Address
//!
//! The value every resolution path produces.

use std::net::{IpAddr, SocketAddr};

use serde::Serialize;

/// Address reported when nothing better can be determined
pub const DEFAULT_IP: &str = "127.0.0.1";

/// Address, port and security flag of the originating client
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RemoteInfo {
    /// Client address, never empty
    pub ip: String,

    /// Client port, 0 when unknown
    pub port: u16,

    /// Whether the client connection was secured. No resolution path sets this yet.
    pub secure: bool,
}

impl RemoteInfo {
    /// Build a RemoteInfo, substituting the loopback address for an empty ip
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        let ip = ip.into();
        Self {
            ip: if ip.is_empty() { DEFAULT_IP.to_string() } else { ip },
            port,
            secure: false,
        }
    }

    /// Parse the ip/port pair back into a socket address.
    ///
    /// Returns `None` when `ip` is not an address literal, which can happen for
    /// values taken verbatim from a transport object.
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.ip
            .parse::<IpAddr>()
            .ok()
            .map(|ip| SocketAddr::new(ip, self.port))
    }
}

/// Coerce a textual port to a number, 0 when unparsable or out of range
pub(crate) fn parse_port(value: &str) -> u16 {
    value.trim().parse().unwrap_or(0)
}

impl Default for RemoteInfo {
    fn default() -> Self {
        Self::new(DEFAULT_IP, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_is_loopback() {
        assert_eq!(
            RemoteInfo::default(),
            RemoteInfo {
                ip: "127.0.0.1".to_string(),
                port: 0,
                secure: false,
            }
        );
    }

    #[test]
    fn test_empty_ip_falls_back() {
        assert_eq!(RemoteInfo::new("", 80).ip, DEFAULT_IP);
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("443"), 443);
        assert_eq!(parse_port(" 8080 "), 8080);
        assert_eq!(parse_port(""), 0);
        assert_eq!(parse_port("http"), 0);
        assert_eq!(parse_port("-1"), 0);
        assert_eq!(parse_port("70000"), 0);
    }

    #[test]
    fn test_socket_addr() {
        let info = RemoteInfo::new("::1", 8080);
        assert_eq!(
            info.socket_addr(),
            Some("[::1]:8080".parse::<SocketAddr>().unwrap())
        );
        assert!(RemoteInfo::new("example.com", 80).socket_addr().is_none());
    }
}
