//! Fragment builder (C5): turns a matched element's raw verbatim text plus
//! the current context into a standalone, well-formed XML fragment.

use std::collections::HashMap;

use crate::name::QName;

/// Wrap mode (§4.4): concatenate every recorded ancestor start-tag segment,
/// the raw match, and synthetic closing tags for the still-open ancestors,
/// innermost first.
pub fn wrap(segments: &[(QName, String)], raw: &str) -> String {
    let mut out = String::new();
    for (_, text) in segments {
        out.push_str(text);
    }
    out.push_str(raw);
    for (name, _) in segments.iter().rev() {
        out.push_str("</");
        out.push_str(&name.qualified());
        out.push('>');
    }
    out
}

/// Inject mode (§4.4): splice every in-scope namespace binding not already
/// declared on the matched element's own start tag into that start tag.
pub fn inject(raw: &str, frame: &HashMap<String, String>) -> String {
    let bytes = raw.as_bytes();
    let (tag_end, self_closing) = scan_start_tag(bytes);
    let attrs = scan_attributes(&bytes[..tag_end]);

    let mut declared: Vec<&str> = Vec::new();
    let mut quote = b'"';
    let mut found_quote = false;
    for (key, _value, q) in &attrs {
        if let Some(prefix) = xmlns_prefix(key) {
            declared.push(prefix);
            if !found_quote {
                quote = *q;
                found_quote = true;
            }
        }
    }

    let mut additions = String::new();
    // Deterministic order keeps output stable across runs.
    let mut keys: Vec<&String> = frame.keys().collect();
    keys.sort();
    for prefix in keys {
        if declared.contains(&prefix.as_str()) {
            continue;
        }
        let uri = &frame[prefix];
        let q = quote as char;
        if prefix.is_empty() {
            additions.push_str(&format!(" xmlns={q}{uri}{q}"));
        } else {
            additions.push_str(&format!(" xmlns:{prefix}={q}{uri}{q}"));
        }
    }

    let insert_at = if self_closing { tag_end - 1 } else { tag_end };
    let mut out = String::with_capacity(raw.len() + additions.len());
    out.push_str(&raw[..insert_at]);
    out.push_str(&additions);
    out.push_str(&raw[insert_at..]);
    out
}

/// `""` is the default-namespace attribute (`xmlns="..."`); `Some(prefix)`
/// for `xmlns:prefix="..."`; `None` if `key` is not an xmlns declaration.
fn xmlns_prefix(key: &[u8]) -> Option<&str> {
    if key == b"xmlns" {
        Some("")
    } else if let Some(rest) = key.strip_prefix(b"xmlns:") {
        std::str::from_utf8(rest).ok()
    } else {
        None
    }
}

/// Finds the index of the start tag's closing `>`, quote-aware so a `>`
/// inside an attribute value isn't mistaken for the tag end. Returns the
/// index and whether the tag is self-closing (`/>`).
fn scan_start_tag(bytes: &[u8]) -> (usize, bool) {
    let mut i = 0;
    let mut in_quote: Option<u8> = None;
    while i < bytes.len() {
        let b = bytes[i];
        match in_quote {
            Some(q) => {
                if b == q {
                    in_quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' => in_quote = Some(b),
                b'>' => {
                    let self_closing = i > 0 && bytes[i - 1] == b'/';
                    return (i, self_closing);
                }
                _ => {}
            },
        }
        i += 1;
    }
    (bytes.len(), false)
}

/// A minimal, non-backtracking attribute scanner: yields `(key, value,
/// quote_char)` triples from inside a start tag's bytes (excluding the
/// closing `>`/`/>`). Only used to locate existing `xmlns` declarations, not
/// as a general attribute parser.
fn scan_attributes(tag: &[u8]) -> Vec<(&[u8], &[u8], u8)> {
    let mut attrs = Vec::new();
    let mut i = match memchr::memchr(b' ', tag).or_else(|| memchr::memchr(b'\t', tag)) {
        Some(pos) => pos,
        None => return attrs,
    };
    loop {
        while i < tag.len() && tag[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= tag.len() {
            break;
        }
        let key_start = i;
        while i < tag.len() && tag[i] != b'=' && !tag[i].is_ascii_whitespace() {
            i += 1;
        }
        let key_end = i;
        if key_start == key_end {
            break;
        }
        while i < tag.len() && tag[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= tag.len() || tag[i] != b'=' {
            break;
        }
        i += 1;
        while i < tag.len() && tag[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= tag.len() || (tag[i] != b'"' && tag[i] != b'\'') {
            break;
        }
        let quote = tag[i];
        i += 1;
        let value_start = i;
        let value_end = match memchr::memchr(quote, &tag[i..]) {
            Some(rel) => i + rel,
            None => break,
        };
        attrs.push((&tag[key_start..key_end], &tag[value_start..value_end], quote));
        i = value_end + 1;
    }
    attrs
}
