//! realaddr
//!
//! Resolves the real address, port and security flag of clients connecting
//! through reverse proxies and load balancers.
//!
//! ```
//! use std::collections::HashMap;
//! use realaddr::{resolve, RemoteInfo, Transport};
//!
//! let mut headers = HashMap::new();
//! headers.insert("x-forwarded-for".to_string(), "203.0.113.5, 10.0.0.1".to_string());
//! headers.insert("x-forwarded-port".to_string(), "443,8080".to_string());
//!
//! let transport = Transport::default().with_remote("10.0.0.1", 52000);
//! assert_eq!(resolve(&transport, &headers, None), RemoteInfo::new("203.0.113.5", 443));
//! ```

pub mod config;
pub mod proxy;

pub use proxy::{resolve, HeaderLookup, RemoteInfo, Transport};
