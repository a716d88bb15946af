//! Target Resolver - host list loading and CIDR expansion
//!
//! Turns user input into an ordered list of host strings. Two sources are
//! supported:
//! - a line-delimited host file: "hosts.txt"
//! - an IPv4 CIDR block: "10.20.0.0/16"

use anyhow::{Context, Result};
use ipnet::Ipv4Net;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

/// Expansions above this many addresses need `BUGSCAN_ALLOW_LARGE_CIDR=1`.
pub const MAX_CIDR_HOSTS: u64 = 1 << 20;

/// Where the host list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSource {
    File(PathBuf),
    Cidr(String),
}

pub struct TargetResolver;

impl TargetResolver {
    /// Expand a source into host strings, keeping input order.
    pub async fn expand(source: &TargetSource) -> Result<Vec<String>> {
        match source {
            TargetSource::File(path) => Self::from_file(path).await,
            TargetSource::Cidr(cidr) => expand_cidr(cidr),
        }
    }

    /// Read a host file: one host per line, blank lines skipped.
    pub async fn from_file(path: &Path) -> Result<Vec<String>> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read host file {}", path.display()))?;
        Ok(parse_host_lines(&content))
    }
}

/// Split line-delimited content into trimmed, non-empty host strings.
pub fn parse_host_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Expand an IPv4 CIDR block into the addresses strictly between its
/// network and broadcast addresses.
pub fn expand_cidr(cidr: &str) -> Result<Vec<String>> {
    let net: Ipv4Net = cidr
        .trim()
        .parse()
        .with_context(|| format!("Invalid CIDR block: {}", cidr))?;

    let count = usable_host_count(&net);
    let allow_large = std::env::var("BUGSCAN_ALLOW_LARGE_CIDR").ok().map(|v| v == "1").unwrap_or(false);
    if count > MAX_CIDR_HOSTS && !allow_large {
        anyhow::bail!(
            "CIDR {} expands to {} hosts which exceeds the allowed limit of {}. Set BUGSCAN_ALLOW_LARGE_CIDR=1 to override.",
            net, count, MAX_CIDR_HOSTS
        );
    }

    Ok(cidr_hosts(&net).map(|ip| ip.to_string()).collect())
}

/// Number of addresses `cidr_hosts` yields.
pub fn usable_host_count(net: &Ipv4Net) -> u64 {
    let start = u32::from(net.network()) as u64;
    let end = u32::from(net.broadcast()) as u64;
    (end - start).saturating_sub(1)
}

/// Lazily iterate the usable addresses of a block. /31 and /32 yield nothing.
pub fn cidr_hosts(net: &Ipv4Net) -> impl Iterator<Item = Ipv4Addr> {
    let start = u32::from(net.network()) as u64 + 1;
    let end = u32::from(net.broadcast()) as u64;
    (start..end).map(|v| Ipv4Addr::from(v as u32))
}
