//! Forwarding Header Resolution
//!
//! Recovers the client address from headers set by reverse proxies and load
//! balancers. Header values are attacker controlled, so a chain is only
//! trusted when every hop in it is an IP literal.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use smallvec::SmallVec;
use tracing::{debug, trace};

use super::info::{parse_port, RemoteInfo};
use super::ip::is_ip;

/// Header names used by one proxy convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyHeader {
    /// Header carrying the client address chain
    pub ip: &'static str,

    /// Header carrying the matching port chain
    pub port: &'static str,

    /// Header carrying the client protocol. Not consulted during resolution.
    pub proto: Option<&'static str>,
}

/// Known proxy conventions, highest priority first.
///
/// The first entry whose `ip` header is present wins, so reordering this
/// table changes resolution results.
pub static PROXY_HEADERS: [ProxyHeader; 4] = [
    ProxyHeader {
        ip: "x-forwarded-for",
        port: "x-forwarded-port",
        proto: Some("x-forwarded-proto"),
    },
    ProxyHeader {
        ip: "z-forwarded-for",
        port: "z-forwarded-port",
        proto: Some("z-forwarded-proto"),
    },
    ProxyHeader {
        ip: "forwarded",
        port: "forwarded-port",
        proto: Some("forwarded-proto"),
    },
    ProxyHeader {
        ip: "x-real-ip",
        port: "x-real-port",
        proto: None,
    },
];

/// Read access to received request headers.
///
/// Names are looked up exactly as given (lowercase); no case folding is
/// applied beyond what the underlying map does itself. Maps that can hold a
/// header more than once return all of its values joined with `", "`.
pub trait HeaderLookup {
    /// Value of header `name`, if present
    fn header(&self, name: &str) -> Option<Cow<'_, str>>;
}

impl<S: BuildHasher> HeaderLookup for HashMap<String, String, S> {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|v| Cow::Borrowed(v.as_str()))
    }
}

impl HeaderLookup for BTreeMap<String, String> {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|v| Cow::Borrowed(v.as_str()))
    }
}

impl HeaderLookup for hyper::HeaderMap {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        // A single opaque (non visible ASCII) value hides the whole header
        let mut values = self.get_all(name).iter();
        let first = values.next()?.to_str().ok()?;

        let mut joined: Option<String> = None;
        for value in values {
            let value = value.to_str().ok()?;
            let buf = joined.get_or_insert_with(|| first.to_string());
            buf.push_str(", ");
            buf.push_str(value);
        }

        Some(joined.map_or(Cow::Borrowed(first), Cow::Owned))
    }
}

impl<H: HeaderLookup + ?Sized> HeaderLookup for &H {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        (**self).header(name)
    }
}

/// Resolve the client from forwarding headers.
///
/// Commits to the first table entry whose address header is present. If that
/// header holds an empty value or any hop that is not an IP literal, header
/// resolution fails outright; lower-priority entries are never tried.
/// Only the first hop of each chain is kept.
pub fn resolve_headers<H: HeaderLookup + ?Sized>(headers: &H) -> Option<RemoteInfo> {
    let (entry, value) = PROXY_HEADERS
        .iter()
        .find_map(|entry| headers.header(entry.ip).map(|value| (entry, value)))?;

    let hops: SmallVec<[&str; 4]> = value.split(',').map(str::trim).collect();
    if let Some(bad) = hops.iter().find(|hop| !is_ip(hop)) {
        debug!(header = entry.ip, hop = %bad, "Rejecting forwarded chain with invalid hop");
        return None;
    }
    let client = hops.first()?;

    let port = headers
        .header(entry.port)
        .and_then(|ports| ports.split(',').next().map(parse_port))
        .unwrap_or(0);

    trace!(header = entry.ip, ip = %client, port, hops = hops.len(), "Resolved client from headers");
    Some(RemoteInfo::new(*client, port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_table_order() {
        let names: Vec<_> = PROXY_HEADERS.iter().map(|h| h.ip).collect();
        assert_eq!(
            names,
            ["x-forwarded-for", "z-forwarded-for", "forwarded", "x-real-ip"]
        );
        assert!(PROXY_HEADERS[3].proto.is_none());
    }

    #[test]
    fn test_no_known_header() {
        let h = headers(&[("host", "example.com"), ("x-forwarded-host", "a.b")]);
        assert!(resolve_headers(&h).is_none());
    }

    #[test]
    fn test_single_hop_with_port() {
        let h = headers(&[("x-forwarded-for", "198.51.100.7"), ("x-forwarded-port", "8443")]);
        assert_eq!(
            resolve_headers(&h),
            Some(RemoteInfo::new("198.51.100.7", 8443))
        );
    }

    #[test]
    fn test_first_hop_only() {
        let h = headers(&[
            ("x-forwarded-for", "203.0.113.5, 10.0.0.1"),
            ("x-forwarded-port", "443,8080"),
        ]);
        assert_eq!(
            resolve_headers(&h),
            Some(RemoteInfo::new("203.0.113.5", 443))
        );
    }

    #[test_case("" ; "empty value")]
    #[test_case("not-an-ip" ; "garbage")]
    #[test_case("203.0.113.5, proxy.internal" ; "invalid later hop")]
    #[test_case("203.0.113.5,," ; "empty later hop")]
    fn test_invalid_chain_rejected(value: &str) {
        let h = headers(&[("x-forwarded-for", value), ("z-forwarded-for", "192.0.2.1")]);
        assert!(resolve_headers(&h).is_none());
    }

    #[test]
    fn test_priority() {
        let h = headers(&[
            ("x-real-ip", "192.0.2.4"),
            ("forwarded", "192.0.2.3"),
            ("z-forwarded-for", "192.0.2.2"),
        ]);
        assert_eq!(resolve_headers(&h).map(|i| i.ip), Some("192.0.2.2".to_string()));
    }

    #[test]
    fn test_port_from_matched_entry_only() {
        let h = headers(&[("x-real-ip", "192.0.2.4"), ("x-forwarded-port", "443")]);
        assert_eq!(resolve_headers(&h), Some(RemoteInfo::new("192.0.2.4", 0)));
    }

    #[test]
    fn test_unparsable_port() {
        let h = headers(&[("x-real-ip", "::1"), ("x-real-port", "https")]);
        assert_eq!(resolve_headers(&h), Some(RemoteInfo::new("::1", 0)));
    }

    #[test]
    fn test_proto_not_consulted() {
        let h = headers(&[
            ("x-forwarded-for", "192.0.2.9"),
            ("x-forwarded-proto", "https"),
        ]);
        assert_eq!(resolve_headers(&h).map(|i| i.secure), Some(false));
    }

    #[test]
    fn test_hyper_header_map() {
        let mut h = hyper::HeaderMap::new();
        h.insert("x-forwarded-for", "2001:db8::1".parse().unwrap());
        h.insert("x-forwarded-port", "9000".parse().unwrap());
        assert_eq!(
            resolve_headers(&h),
            Some(RemoteInfo::new("2001:db8::1", 9000))
        );
    }

    #[test]
    fn test_hyper_repeated_header_validates_every_line() {
        let mut h = hyper::HeaderMap::new();
        h.append("x-forwarded-for", "203.0.113.5".parse().unwrap());
        h.append("x-forwarded-for", "not-an-ip".parse().unwrap());
        h.insert("z-forwarded-for", "192.0.2.1".parse().unwrap());

        assert_eq!(h.header("x-forwarded-for").as_deref(), Some("203.0.113.5, not-an-ip"));
        assert!(resolve_headers(&h).is_none());
    }

    #[test]
    fn test_hyper_repeated_header_keeps_first_hop() {
        let mut h = hyper::HeaderMap::new();
        h.append("x-forwarded-for", "203.0.113.5".parse().unwrap());
        h.append("x-forwarded-for", "10.0.0.1, 10.0.0.2".parse().unwrap());
        h.append("x-forwarded-port", "443".parse().unwrap());
        h.append("x-forwarded-port", "8080".parse().unwrap());

        assert_eq!(
            resolve_headers(&h),
            Some(RemoteInfo::new("203.0.113.5", 443))
        );
    }

    #[test]
    fn test_hyper_opaque_value_hides_header() {
        let mut h = hyper::HeaderMap::new();
        h.append("x-forwarded-for", "203.0.113.5".parse().unwrap());
        h.append(
            "x-forwarded-for",
            hyper::header::HeaderValue::from_bytes(b"\xff10.0.0.1").unwrap(),
        );

        assert!(h.header("x-forwarded-for").is_none());
        assert_eq!(resolve_headers(&h), None);
    }

    #[test]
    fn test_btree_map() {
        let h: BTreeMap<String, String> =
            [("forwarded".to_string(), "192.0.2.30".to_string())].into();
        assert_eq!(resolve_headers(&h), Some(RemoteInfo::new("192.0.2.30", 0)));
    }
}
