//! Header rewrites applied to an accepted message before it is redistributed.

use crate::message::Message;

/// Rewrites `Subject` to start with `prefix`, dropping any earlier occurrence.
///
/// Replies to list mail already carry the prefix somewhere in their subject
/// ("Re: [list] Hello"); those occurrences are removed so the prefix never
/// accumulates. A missing subject is treated as empty. Applying the rewrite
/// twice gives the same result as applying it once.
pub fn cleanup_subject(message: &mut Message, prefix: &str) {
    let original = message.get_raw("Subject").unwrap_or_default();
    let rewritten = prefixed_subject(original, prefix);
    message.set("Subject", rewritten);
}

/// Computes the rewritten subject line for `subject`.
///
/// Works on the raw header bytes so 8-bit subjects pass through unchanged.
pub fn prefixed_subject(subject: &[u8], prefix: &str) -> Vec<u8> {
    let prefix = collapse_whitespace(prefix.as_bytes());
    if prefix.is_empty() {
        return collapse_whitespace(subject);
    }

    let mut stripped = collapse_whitespace(subject);
    // Removing one occurrence can join its neighbours into a new one
    while contains(&stripped, &prefix) {
        stripped = collapse_whitespace(&remove_all(&stripped, &prefix));
    }

    if stripped.is_empty() {
        prefix
    } else {
        [prefix.as_slice(), stripped.as_slice()].join(&b' ')
    }
}

/// Points replies at the list address instead of the original author.
pub fn stamp_reply_to(message: &mut Message, list_address: &str) {
    message.set("Reply-To", list_address);
}

/// Lazily yields one copy of `message` per recipient, each addressed `To`
/// exactly that recipient, in list order.
pub fn recipient_messages<'a>(
    message: &'a Message,
    recipients: &'a [String],
) -> impl Iterator<Item = (Message, &'a str)> + 'a {
    recipients.iter().map(move |recipient| {
        let mut copy = message.clone();
        copy.set("To", recipient.as_str());
        (copy, recipient.as_str())
    })
}

fn collapse_whitespace(value: &[u8]) -> Vec<u8> {
    value
        .split(|b| b.is_ascii_whitespace())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(&b' ')
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// Drops every non-overlapping occurrence of `needle`, scanning left to right.
fn remove_all(haystack: &[u8], needle: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(haystack.len());
    let mut rest = haystack;
    while !rest.is_empty() {
        if rest.starts_with(needle) {
            rest = &rest[needle.len()..];
        } else {
            out.push(rest[0]);
            rest = &rest[1..];
        }
    }
    out
}
