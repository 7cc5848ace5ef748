//! realaddr command line
//!
//! Resolves a client address from headers and a transport object given on the
//! command line and prints the result as JSON.
//!
//! Usage:
//!   realaddr -H 'x-forwarded-for=203.0.113.5, 10.0.0.1' -H x-forwarded-port=443
//!   realaddr -t '{"remoteAddress": "192.168.1.10", "remotePort": 5000}'

use std::collections::HashMap;
use std::path::PathBuf;

use clap::Parser;
use tracing::debug;

use realaddr::config::Config;
use realaddr::{resolve, Transport};

#[derive(Parser, Debug)]
#[command(name = "realaddr", version, about = "Resolve the real client address behind proxies")]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Received header, name used verbatim (repeatable)
    #[arg(short = 'H', long = "header", value_name = "NAME=VALUE", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Transport object as JSON
    #[arg(short, long, value_name = "JSON", default_value = "{}")]
    transport: String,

    /// Whitelist entry, replaces the configured list (repeatable)
    #[arg(short, long = "whitelist", value_name = "ADDR")]
    whitelist: Vec<String>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(level) = args.log_level {
        config.log.level = level;
    }
    if !args.whitelist.is_empty() {
        config.resolver.whitelist = args.whitelist;
    }

    tracing_subscriber::fmt()
        .with_env_filter(config.log.env_filter()?)
        .with_writer(std::io::stderr)
        .init();

    let transport: Transport = serde_json::from_str(&args.transport)
        .map_err(|e| format!("invalid transport JSON: {}", e))?;
    let headers: HashMap<String, String> = args.headers.into_iter().collect();

    debug!(headers = headers.len(), ?transport, "Resolving client");
    let info = resolve(&transport, &headers, config.resolver.whitelist());

    println!("{}", serde_json::to_string(&info)?);
    Ok(())
}
