//! Proxied Client Resolution
//!
//! Recovers the real client address of a connection that reached the server
//! through reverse proxies or load balancers. Forwarding headers are tried
//! first in a fixed priority order; when none can be trusted the transport
//! object underlying the request decides.

mod headers;
mod info;
mod ip;
mod resolver;
mod transport;

pub use headers::{resolve_headers, HeaderLookup, ProxyHeader, PROXY_HEADERS};
pub use info::{RemoteInfo, DEFAULT_IP};
pub use ip::is_ip;
pub use resolver::resolve;
pub use transport::{
    resolve_transport, resolve_transport_source, Connection, Socket, Transport, TransportSource,
};
