//! Transport Fallback Resolution
//!
//! When no forwarding header can be trusted, the client is taken from the
//! transport object underlying the request. Transport objects come in several
//! shapes (raw sockets, wrapped connections, alternate real-time transports),
//! so they are described structurally: every field is optional and a rule
//! applies as soon as the fields it needs are present.

use std::net::SocketAddr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::trace;

use super::info::{parse_port, RemoteInfo};

/// Connection-like object as seen by a server
///
/// Deserializes from the camelCase field names servers usually expose
/// (`remoteAddress`, `remotePort`, ...). Port fields accept numbers or
/// strings; fields with an unexpected type are treated as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transport {
    /// Peer address of a raw socket
    #[serde(default, deserialize_with = "lenient")]
    pub remote_address: Option<String>,

    /// Peer port paired with `remote_address`
    #[serde(default, deserialize_with = "lenient_port")]
    pub remote_port: Option<u16>,

    /// Address of an alternate transport shape, used together with `port`
    #[serde(default, deserialize_with = "lenient")]
    pub address: Option<String>,

    /// Port of an alternate transport shape, used together with `address`
    #[serde(default, deserialize_with = "lenient_port")]
    pub port: Option<u16>,

    /// Wrapped connection; when present its socket replaces `socket`
    #[serde(default, deserialize_with = "lenient")]
    pub connection: Option<Connection>,

    /// Underlying socket, consulted only when there is no `connection`
    #[serde(default, deserialize_with = "lenient")]
    pub socket: Option<Socket>,
}

/// Wrapped connection nested in a transport
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Peer address of the wrapped connection
    #[serde(default, deserialize_with = "lenient")]
    pub remote_address: Option<String>,

    /// Peer port of the wrapped connection
    #[serde(default, deserialize_with = "lenient_port")]
    pub remote_port: Option<u16>,

    /// Socket the connection wraps
    #[serde(default, deserialize_with = "lenient")]
    pub socket: Option<Socket>,
}

/// Raw socket nested in a transport or connection
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Socket {
    /// Peer address of the socket
    #[serde(default, deserialize_with = "lenient")]
    pub remote_address: Option<String>,
}

/// Which fallback rule produced a transport result, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportSource {
    /// `remoteAddress` / `remotePort` on the transport itself
    Remote,
    /// `address` / `port` on the transport itself
    Alternate,
    /// `connection.remoteAddress` / `connection.remotePort`
    Connection,
    /// `remoteAddress` of the connection's socket, or of the transport's own socket
    Socket,
    /// Nothing usable, loopback reported
    Default,
}

impl Transport {
    /// Set `remote_address` and `remote_port`
    pub fn with_remote(mut self, address: impl Into<String>, port: u16) -> Self {
        self.remote_address = Some(address.into());
        self.remote_port = Some(port);
        self
    }

    /// Set the alternate `address` and `port` pair
    pub fn with_address(mut self, address: impl Into<String>, port: u16) -> Self {
        self.address = Some(address.into());
        self.port = Some(port);
        self
    }

    /// Attach a wrapped connection
    pub fn with_connection(mut self, connection: Connection) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Attach the transport's own socket
    pub fn with_socket(mut self, socket: Socket) -> Self {
        self.socket = Some(socket);
        self
    }

    /// Socket consulted by the last fallback rule
    fn derived_socket(&self) -> Option<&Socket> {
        match &self.connection {
            Some(connection) => connection.socket.as_ref(),
            None => self.socket.as_ref(),
        }
    }
}

impl From<SocketAddr> for Transport {
    fn from(addr: SocketAddr) -> Self {
        Transport::default().with_remote(addr.ip().to_string(), addr.port())
    }
}

impl Connection {
    /// Connection with a known peer address and port
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            remote_address: Some(address.into()),
            remote_port: Some(port),
            socket: None,
        }
    }

    /// Attach the wrapped socket
    pub fn with_socket(mut self, socket: Socket) -> Self {
        self.socket = Some(socket);
        self
    }
}

impl Socket {
    /// Socket with a known peer address
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            remote_address: Some(address.into()),
        }
    }
}

/// Resolve the client from the transport object alone, reporting the rule used.
///
/// Rules are tried in [`TransportSource`] order and the first whose fields are
/// present decides.
pub fn resolve_transport_source(transport: &Transport) -> (TransportSource, RemoteInfo) {
    if let Some(ip) = &transport.remote_address {
        let port = transport.remote_port.unwrap_or(0);
        return (TransportSource::Remote, RemoteInfo::new(ip.as_str(), port));
    }

    if let (Some(ip), Some(port)) = (&transport.address, transport.port) {
        return (TransportSource::Alternate, RemoteInfo::new(ip.as_str(), port));
    }

    if let Some(connection) = &transport.connection {
        if let Some(ip) = &connection.remote_address {
            let port = connection.remote_port.unwrap_or(0);
            return (TransportSource::Connection, RemoteInfo::new(ip.as_str(), port));
        }
    }

    if let Some(ip) = transport.derived_socket().and_then(|s| s.remote_address.as_ref()) {
        // Port is read from the address field, kept for compatibility
        return (TransportSource::Socket, RemoteInfo::new(ip.as_str(), parse_port(ip)));
    }

    (TransportSource::Default, RemoteInfo::default())
}

/// Resolve the client from the transport object alone
pub fn resolve_transport(transport: &Transport) -> RemoteInfo {
    let (source, info) = resolve_transport_source(transport);
    trace!(?source, ip = %info.ip, port = info.port, "Resolved client from transport");
    info
}

/// Deserialize an optional field, treating a value of the wrong type as missing
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Deserialize a port given as number or string, coercing bad values to 0
fn lenient_port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => Some(
            n.as_u64()
                .and_then(|n| u16::try_from(n).ok())
                .unwrap_or(0),
        ),
        Some(Value::String(s)) => Some(parse_port(&s)),
        Some(_) => Some(0),
    })
}
