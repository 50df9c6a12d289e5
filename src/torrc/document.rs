//! In-memory torrc: an ordered list of raw lines.
//!
//! No grammar is parsed. A line is identified by its leading whitespace-separated
//! token, which is enough to find the handful of directives mojenx edits while
//! passing comments and everything else through untouched. Lines are kept as
//! bytes: a torrc is not required to be UTF-8, and a Latin-1 comment must come
//! back out exactly as it went in.

use std::borrow::Cow;

/// Listen port directive.
pub const SOCKS_PORT: &str = "SocksPort";

/// Exit node country set directive.
pub const EXIT_NODES: &str = "ExitNodes";

/// Bridge switch directive.
pub const USE_BRIDGES: &str = "UseBridges";

/// One bridge relay per line; the directive repeats.
pub const BRIDGE: &str = "Bridge";

/// Port Tor listens on when no `SocksPort` line is present.
pub const DEFAULT_SOCKS_PORT: u16 = 9050;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TorrcDocument {
    lines: Vec<Vec<u8>>,
}

impl TorrcDocument {
    pub fn from_lines(lines: Vec<Vec<u8>>) -> Self {
        Self { lines }
    }

    /// Split file content into lines. `\r\n` endings are normalized away.
    pub fn parse(content: impl AsRef<[u8]>) -> Self {
        let content = content.as_ref();
        if content.is_empty() {
            return Self::default();
        }

        let body = content.strip_suffix(b"\n").unwrap_or(content);
        let lines = body
            .split(|b| *b == b'\n')
            .map(|line| line.strip_suffix(b"\r").unwrap_or(line).to_vec())
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[Vec<u8>] {
        &self.lines
    }

    /// Lines for display. Bytes that are not UTF-8 show as U+FFFD.
    pub fn display_lines(&self) -> impl Iterator<Item = Cow<'_, str>> {
        self.lines.iter().map(|line| String::from_utf8_lossy(line))
    }

    pub fn into_lines(self) -> Vec<Vec<u8>> {
        self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// File representation: every line terminated by exactly one `\n`.
    pub fn render(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            out.extend_from_slice(line);
            out.push(b'\n');
        }
        out
    }

    /// Lines joined with `\n`, as returned by the read/status API.
    pub fn text(&self) -> String {
        self.display_lines().collect::<Vec<_>>().join("\n")
    }

    /// Value of the first line keyed by `key`, without the key itself.
    pub fn directive_value(&self, key: &str) -> Option<Cow<'_, str>> {
        self.lines.iter().find_map(|line| {
            let (token, rest) = split_token(line)?;
            (token == key.as_bytes()).then(|| String::from_utf8_lossy(trim_ascii(rest)))
        })
    }

    /// Number of lines keyed by `key`.
    pub fn count_directive(&self, key: &str) -> usize {
        self.lines
            .iter()
            .filter(|line| leading_token(line) == Some(key.as_bytes()))
            .count()
    }

    /// SOCKS port Tor is configured to listen on.
    ///
    /// Understands `9050`, `127.0.0.1:9050`, `[::1]:9050` and trailing isolation
    /// flags. Anything else (`auto`, `0`, garbage) falls back to the default.
    pub fn socks_port(&self) -> u16 {
        self.directive_value(SOCKS_PORT)
            .and_then(|value| parse_socks_port(&value))
            .unwrap_or(DEFAULT_SOCKS_PORT)
    }

    /// True when `UseBridges` is set to a value Tor reads as on.
    pub fn bridges_enabled(&self) -> bool {
        matches!(
            self.directive_value(USE_BRIDGES).as_deref(),
            Some("1" | "true" | "yes" | "on")
        )
    }
}

/// First whitespace-separated token of a line, if any.
pub fn leading_token(line: &[u8]) -> Option<&[u8]> {
    split_token(line).map(|(token, _)| token)
}

/// Leading token and everything after it.
fn split_token(line: &[u8]) -> Option<(&[u8], &[u8])> {
    let start = line.iter().position(|b| !b.is_ascii_whitespace())?;
    let rest = &line[start..];
    let end = rest
        .iter()
        .position(u8::is_ascii_whitespace)
        .unwrap_or(rest.len());
    Some(rest.split_at(end))
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

fn parse_socks_port(value: &str) -> Option<u16> {
    let address = value.split_whitespace().next()?;
    let port = address.rsplit(':').next()?;
    port.parse::<u16>().ok().filter(|p| *p != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_render() {
        let doc = TorrcDocument::parse("# comment\r\nSocksPort 9050\n\nLog notice stdout");
        assert_eq!(doc.lines().len(), 4);
        assert_eq!(doc.lines()[0], b"# comment");
        assert_eq!(doc.render(), b"# comment\nSocksPort 9050\n\nLog notice stdout\n");
        assert_eq!(doc.text(), "# comment\nSocksPort 9050\n\nLog notice stdout");
    }

    #[test]
    fn test_empty_content() {
        let doc = TorrcDocument::parse("");
        assert!(doc.is_empty());
        assert!(doc.render().is_empty());
        assert_eq!(TorrcDocument::parse("\n").lines().len(), 1);
    }

    #[test]
    fn test_non_utf8_lines_round_trip() {
        let raw: &[u8] = b"# caf\xe9 exit policy\nSocksPort 9050\n";
        let doc = TorrcDocument::parse(raw);

        assert_eq!(doc.render(), raw);
        assert_eq!(doc.socks_port(), 9050);
        assert_eq!(doc.text(), "# caf\u{fffd} exit policy\nSocksPort 9050");
    }

    #[test]
    fn test_directive_value_first_match_wins() {
        let doc = TorrcDocument::parse("  SocksPort 9150  \nSocksPort 9250\n");
        assert_eq!(doc.directive_value(SOCKS_PORT).as_deref(), Some("9150"));
        assert_eq!(doc.count_directive(SOCKS_PORT), 2);
    }

    #[test]
    fn test_leading_token_is_exact() {
        let doc = TorrcDocument::parse("#SocksPort 1\nSocksPortX 2\nsocksport 3\n");
        assert_eq!(doc.directive_value(SOCKS_PORT), None);
        assert_eq!(doc.socks_port(), DEFAULT_SOCKS_PORT);
        assert_eq!(leading_token(b"  \t "), None);
        assert_eq!(leading_token(b"\tBridge obfs4"), Some(&b"Bridge"[..]));
    }

    #[test]
    fn test_socks_port_forms() {
        let cases = [
            ("SocksPort 9150", 9150),
            ("SocksPort 127.0.0.1:9250", 9250),
            ("SocksPort [::1]:9350", 9350),
            ("SocksPort 9450 IsolateDestAddr", 9450),
            ("SocksPort auto", DEFAULT_SOCKS_PORT),
            ("SocksPort 0", DEFAULT_SOCKS_PORT),
            ("SocksPort", DEFAULT_SOCKS_PORT),
        ];
        for (line, expected) in cases {
            assert_eq!(TorrcDocument::parse(line).socks_port(), expected, "{line}");
        }
    }

    #[test]
    fn test_bridges_enabled() {
        assert!(TorrcDocument::parse("UseBridges 1\n").bridges_enabled());
        assert!(!TorrcDocument::parse("UseBridges 0\n").bridges_enabled());
        assert!(!TorrcDocument::parse("Bridge obfs4 192.0.2.1:443\n").bridges_enabled());
    }
}
