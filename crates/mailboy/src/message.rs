//! In-memory representation of a fetched mail message.
//!
//! Headers are kept as an ordered list of raw name/value pairs so that a message
//! can be mutated (subject rewrite, `To` substitution) and written back out
//! without touching anything else. Values are stored as the original bytes:
//! they are not RFC 2047 decoded, 8-bit values survive unchanged, and folded
//! values keep their continuation lines.

use std::borrow::Cow;

use log::debug;
use mail_parser::MessageParser;

use crate::error::MessageError;

/// A single header field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: Vec<u8>,
}

impl Header {
    /// Value as text, with invalid UTF-8 replaced.
    pub fn value_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.value)
    }
}

/// A mail message: ordered headers plus an opaque body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    headers: Vec<Header>,
    body: Vec<u8>,
}

impl Message {
    /// Creates an empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw RFC 5322 message.
    ///
    /// The header section ends at the first empty line; everything after it is
    /// kept byte-for-byte as the body. A message without an empty line is all
    /// headers and has an empty body.
    ///
    /// Parsing is lenient: a line that is not a `name: value` field is kept as
    /// a continuation of the header before it, and stray lines ahead of the
    /// first field are dropped. Only a header section with no field at all is
    /// an error.
    pub fn parse(raw: &[u8]) -> Result<Self, MessageError> {
        let (header_block, body) = split_header_block(raw);

        let mut headers: Vec<Header> = Vec::new();
        for (index, line) in header_block.split(|&b| b == b'\n').enumerate() {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.is_empty() {
                continue;
            }

            if let Some((name, value)) = header_field(line) {
                headers.push(Header {
                    name,
                    value: value.to_vec(),
                });
                continue;
            }

            match headers.last_mut() {
                Some(last) => {
                    if !is_folded(line) {
                        debug!("Header line {} has no field name, kept as continuation", index + 1);
                    }
                    last.value.extend_from_slice(b"\r\n");
                    last.value.extend_from_slice(line);
                }
                None => debug!("Dropping header line {} before the first field", index + 1),
            }
        }

        if headers.is_empty() {
            return Err(MessageError::MissingHeaders);
        }

        Ok(Self {
            headers,
            body: body.to_vec(),
        })
    }

    /// All headers in message order.
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// First value of the named header (case-insensitive) as text.
    pub fn get(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get_raw(name).map(String::from_utf8_lossy)
    }

    /// First value of the named header, byte-for-byte.
    pub fn get_raw(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_slice())
    }

    /// Every value of the named header, in message order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = Cow<'a, str>> + 'a {
        self.headers
            .iter()
            .filter(move |h| h.name.eq_ignore_ascii_case(name))
            .map(Header::value_lossy)
    }

    /// Appends a header, keeping any existing ones with the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.headers.push(Header {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Removes every occurrence of the named header and returns how many were removed.
    pub fn delete(&mut self, name: &str) -> usize {
        let before = self.headers.len();
        self.headers.retain(|h| !h.name.eq_ignore_ascii_case(name));
        before - self.headers.len()
    }

    /// Replaces the named header: all occurrences are removed and one is appended.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) {
        let name = name.into();
        self.delete(&name);
        self.append(name, value);
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Serializes the message with CRLF header line endings and the body verbatim.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.header_block();
        out.extend_from_slice(&self.body);
        out
    }

    /// Mailbox address of the `From` header, if it is usable as an SMTP
    /// envelope sender.
    ///
    /// mail-parser recovers something from most malformed `From` values
    /// (`"john doe"@example.org` yields `@example.org`), so the result is only
    /// returned when lettre accepts it as an address.
    pub fn sender_address(&self) -> Option<String> {
        let raw = self.header_block();
        let parsed = MessageParser::default().parse(raw.as_slice())?;
        parsed
            .from()
            .and_then(|addr| addr.first())
            .and_then(|a| a.address())
            .filter(|address| address.parse::<lettre::Address>().is_ok())
            .map(|s| s.to_string())
    }

    /// Decoded subject for log output.
    pub fn display_subject(&self) -> String {
        let raw = self.header_block();
        MessageParser::default()
            .parse(raw.as_slice())
            .and_then(|parsed| parsed.subject().map(|s| s.to_string()))
            .unwrap_or_else(|| "(no subject)".to_string())
    }

    /// Header section including the terminating empty line.
    fn header_block(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.headers.len() * 64 + 2);
        for header in &self.headers {
            out.extend_from_slice(header.name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(&header.value);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"\r\n");
        out
    }
}

fn is_folded(line: &[u8]) -> bool {
    matches!(line.first(), Some(b' ') | Some(b'\t'))
}

/// Splits `name: value` when `line` starts a new field.
///
/// The name must be printable ASCII without spaces; whitespace between the
/// name and the colon is tolerated.
fn header_field(line: &[u8]) -> Option<(String, &[u8])> {
    if is_folded(line) {
        return None;
    }
    let colon = line.iter().position(|&b| b == b':')?;
    let name = line[..colon].trim_ascii_end();
    if name.is_empty() || !name.iter().all(|b| b.is_ascii_graphic()) {
        return None;
    }
    let name = std::str::from_utf8(name).ok()?.to_string();
    Some((name, line[colon + 1..].trim_ascii_start()))
}

/// Splits a raw message at the first empty line (CRLF or bare LF).
fn split_header_block(raw: &[u8]) -> (&[u8], &[u8]) {
    let mut line_start = 0;
    while line_start < raw.len() {
        let line_end = match raw[line_start..].iter().position(|&b| b == b'\n') {
            Some(pos) => line_start + pos,
            None => return (raw, &[]),
        };
        let line = &raw[line_start..line_end];
        if line.is_empty() || line == b"\r" {
            return (&raw[..line_start], &raw[line_end + 1..]);
        }
        line_start = line_end + 1;
    }
    (raw, &[])
}
