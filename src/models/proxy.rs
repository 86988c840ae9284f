use std::{fmt, net::Ipv6Addr};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{FetcherError, Result};

/// Everything outside the RFC 3986 unreserved set gets encoded, so `:`, `@`
/// and `/` in credentials can't break the authority section.
const USERINFO: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub const DEFAULT_SCHEME: &str = "http";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRecord {
    pub id: String,
    pub scheme: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyUrl(String);

impl ProxyUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProxyUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ProxyRecord {
    pub fn to_url(&self) -> Result<ProxyUrl> {
        let host = self
            .host
            .as_deref()
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .ok_or_else(|| FetcherError::format(&self.id, "missing host"))?;
        let port = self
            .port
            .filter(|port| *port != 0)
            .ok_or_else(|| FetcherError::format(&self.id, "missing port"))?;

        let host = authority_host(host)
            .ok_or_else(|| FetcherError::format(&self.id, format!("invalid host {host:?}")))?;

        let url = if self.username.is_empty() || self.password.is_empty() {
            format!("{scheme}://{host}:{port}", scheme = self.scheme)
        } else {
            format!(
                "{scheme}://{username}:{password}@{host}:{port}",
                scheme = self.scheme,
                username = utf8_percent_encode(&self.username, USERINFO),
                password = utf8_percent_encode(&self.password, USERINFO),
            )
        };

        Ok(ProxyUrl(url))
    }
}

// IPv6 literals get bracketed; anything else that could leak into the path,
// query or userinfo part of the url is rejected.
fn authority_host(host: &str) -> Option<String> {
    let bare = host
        .strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .unwrap_or(host);
    if let Ok(addr) = bare.parse::<Ipv6Addr>() {
        return Some(format!("[{addr}]"));
    }

    let forbidden =
        |ch: char| ch.is_whitespace() || matches!(ch, '/' | '?' | '#' | '@' | ':' | '[' | ']');
    if host.contains(forbidden) {
        return None;
    }
    Some(host.to_string())
}

/// Formats every record in provider order. The first malformed record fails
/// the whole batch.
pub fn format_proxies(records: Vec<ProxyRecord>) -> Result<Vec<ProxyUrl>> {
    records.iter().map(ProxyRecord::to_url).collect()
}
