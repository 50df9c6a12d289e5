//! Directive edits applied as a line transform.
//!
//! `apply` rewrites the first line of each edited directive in place, drops
//! any later duplicates of that directive, and appends fresh lines for every
//! edit whose directive was absent. An edit carries zero or more values: one
//! line is written per value, so a repeated directive like `Bridge` can be
//! replaced as a block, and an empty edit removes the directive. Untouched
//! lines keep their original bytes and order.

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::error::{MojenxError, Result};
use crate::torrc::countries;
use crate::torrc::document::{
    leading_token, TorrcDocument, BRIDGE, EXIT_NODES, SOCKS_PORT, USE_BRIDGES,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    key: String,
    values: Vec<String>,
}

impl Edit {
    fn lines(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        self.values
            .iter()
            .map(move |value| format!("{} {value}", self.key).into_bytes())
    }
}

/// Ordered mapping from directive key to its new value(s).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSet {
    edits: Vec<Edit>,
}

impl EditSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing an earlier edit of the same key.
    pub fn set(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let value: String = value.into();
        self.set_all(key, [value])
    }

    /// Replace every `key` line with one line per value.
    pub fn set_all<V>(mut self, key: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<String>,
    {
        let key = key.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        match self.edits.iter_mut().find(|edit| edit.key == key) {
            Some(existing) => existing.values = values,
            None => self.edits.push(Edit { key, values }),
        }
        self
    }

    /// Drop every `key` line.
    pub fn remove(self, key: impl Into<String>) -> Self {
        self.set_all(key, Vec::<String>::new())
    }

    pub fn socks_port(self, port: u16) -> Self {
        self.set(SOCKS_PORT, port.to_string())
    }

    pub fn exit_nodes(self, countries: &CountrySet) -> Self {
        self.set(EXIT_NODES, countries.render())
    }

    /// Turn bridges on and make `bridges` the complete bridge list.
    pub fn bridges(self, bridges: &BridgeSet) -> Self {
        self.set(USE_BRIDGES, "1")
            .set_all(BRIDGE, bridges.lines().iter().cloned())
    }

    /// Turn bridges off and forget the configured relays.
    pub fn disable_bridges(self) -> Self {
        self.set(USE_BRIDGES, "0").remove(BRIDGE)
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.edits.iter().map(|edit| edit.key.as_str())
    }

    fn entry(&self, key: &str) -> Option<&Edit> {
        self.edits.iter().find(|edit| edit.key == key)
    }
}

/// Apply `edits` to `document`, returning the new document.
pub fn apply(document: &TorrcDocument, edits: &EditSet) -> TorrcDocument {
    let mut satisfied: HashSet<&str> = HashSet::new();
    let mut out = Vec::with_capacity(document.lines().len() + edits.edits.len());

    for line in document.lines() {
        let edit = leading_token(line)
            .and_then(|token| std::str::from_utf8(token).ok())
            .and_then(|token| edits.entry(token));

        match edit {
            Some(edit) if satisfied.contains(edit.key.as_str()) => {}
            Some(edit) => {
                out.extend(edit.lines());
                satisfied.insert(edit.key.as_str());
            }
            None => out.push(line.clone()),
        }
    }

    for edit in &edits.edits {
        if !satisfied.contains(edit.key.as_str()) {
            out.extend(edit.lines());
        }
    }

    TorrcDocument::from_lines(out)
}

/// Validate a requested listen port.
///
/// Rejects non-positive values and anything that does not fit a TCP port.
pub fn validate_port(port: i64) -> Result<u16> {
    u16::try_from(port)
        .ok()
        .filter(|p| *p > 0)
        .ok_or_else(|| MojenxError::validation("invalid port"))
}

/// Exit node country codes in the order given.
///
/// Duplicates are kept and nothing is sorted: Tor accepts repeated groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountrySet {
    codes: Vec<String>,
}

impl CountrySet {
    /// Parse a comma and/or whitespace separated list such as `"tr, DE"`.
    ///
    /// Empty entries are dropped and codes are lowercased. Fails when nothing
    /// is left or a code is not an ISO 3166-1 alpha-2 code.
    pub fn parse(input: &str) -> Result<Self> {
        let mut codes = Vec::new();
        for raw in input.split(|c: char| c == ',' || c.is_whitespace()) {
            let code = raw.trim().to_ascii_lowercase();
            if code.is_empty() {
                continue;
            }
            if !countries::is_known(&code) {
                return Err(MojenxError::validation(format!("invalid country code '{code}'")));
            }
            codes.push(code);
        }

        if codes.is_empty() {
            return Err(MojenxError::validation("invalid codes"));
        }
        Ok(Self { codes })
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    /// `{tr}{de}` form used by the `ExitNodes` directive.
    pub fn render(&self) -> String {
        self.codes.iter().map(|c| format!("{{{c}}}")).collect()
    }
}

/// Bridge relay lines, without the `Bridge` keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSet {
    lines: Vec<String>,
}

impl BridgeSet {
    /// Accepts lines as bridge providers hand them out, e.g.
    /// `obfs4 192.0.2.7:443 <fingerprint> cert=... iat-mode=0`, with or
    /// without a leading `Bridge`. Blank entries are skipped.
    ///
    /// Each line needs a `host:port` address as its first or second field
    /// (plain bridge or transport bridge). Fails when nothing is left.
    pub fn parse<'a>(entries: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut lines = Vec::new();
        for entry in entries {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            if entry.contains(['\n', '\r']) {
                return Err(MojenxError::validation("invalid bridge line"));
            }

            let line = match entry.split_once(char::is_whitespace) {
                Some((BRIDGE, rest)) => rest.trim(),
                _ => entry,
            };
            let has_address = line
                .split_whitespace()
                .take(2)
                .any(|field| field.parse::<SocketAddr>().is_ok());
            if !has_address {
                return Err(MojenxError::validation(format!("invalid bridge line '{line}'")));
            }
            lines.push(line.to_string());
        }

        if lines.is_empty() {
            return Err(MojenxError::validation("invalid bridges"));
        }
        Ok(Self { lines })
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}
