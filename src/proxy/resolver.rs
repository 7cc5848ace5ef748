//! Client Address Resolution
//!
//! Combines header and transport resolution into a single infallible call.

use super::headers::{resolve_headers, HeaderLookup};
use super::info::RemoteInfo;
use super::transport::{resolve_transport, Transport};

/// Resolve the originating client of a connection.
///
/// This function:
/// 1. Tries the forwarding headers in priority order
/// 2. Falls back to the transport object only if no header produced a result
///
/// `whitelist` is accepted for API stability and is currently not consulted.
/// Resolution never fails; when nothing is usable the loopback default is
/// returned.
pub fn resolve<H>(transport: &Transport, headers: &H, _whitelist: Option<&[String]>) -> RemoteInfo
where
    H: HeaderLookup + ?Sized,
{
    resolve_headers(headers).unwrap_or_else(|| resolve_transport(transport))
}
