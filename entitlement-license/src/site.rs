//! The installation a license is bound to.
//!
//! The site URL doubles as the activation fingerprint; its host is resolved
//! to decide whether the installation is local (private or reserved address).

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, ToSocketAddrs};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Identity of the installation as seen by the entitlement service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteInfo {
    /// Site URL, used as the activation fingerprint.
    pub url: String,
    /// Human-readable site name sent with activations.
    pub name: String,
}

impl SiteInfo {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
        }
    }

    /// Host component of the site URL, if the URL parses.
    pub fn host(&self) -> Option<String> {
        reqwest::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_matches(['[', ']']).to_string()))
    }

    /// Resolves the site host to an address.
    ///
    /// Falls back to the host name itself when resolution fails, and to an
    /// empty string when the URL has no host.
    pub fn resolve_ip(&self) -> String {
        let Some(host) = self.host() else {
            return String::new();
        };
        if let Ok(ip) = host.parse::<IpAddr>() {
            return ip.to_string();
        }
        match (host.as_str(), 0).to_socket_addrs() {
            Ok(mut addrs) => match addrs.next() {
                Some(addr) => addr.ip().to_string(),
                None => host,
            },
            Err(e) => {
                debug!(host = %host, error = %e, "site host did not resolve");
                host
            }
        }
    }
}

/// Returns true if `ip` is outside every private and reserved range.
pub fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => is_public_v6(v6),
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    let reserved = a == 0 || a >= 240 || (a == 100 && (64..128).contains(&b));
    !(ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_broadcast()
        || ip.is_documentation()
        || reserved)
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_public_v4(v4);
    }
    let first = ip.segments()[0];
    let unique_local = (first & 0xfe00) == 0xfc00;
    let link_local = (first & 0xffc0) == 0xfe80;
    let documentation = first == 0x2001 && ip.segments()[1] == 0x0db8;
    !(ip.is_loopback() || ip.is_unspecified() || unique_local || link_local || documentation)
}
