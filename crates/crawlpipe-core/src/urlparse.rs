//! Minimal URL splitting and query string parsing for crawler url columns

use std::collections::BTreeMap;

/// Decoded query string: parameter name → values in order of appearance
pub type QueryString = BTreeMap<String, Vec<String>>;

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Path component of a URL: scheme, netloc, query and fragment removed.
///
/// `host:8080` style inputs (digits only after the colon) are not treated as
/// having a scheme.
pub fn url_path(url: &str) -> &str {
    let mut rest = url;
    if let Some((scheme, after)) = rest.split_once(':') {
        let port_like = after.bytes().all(|b| b.is_ascii_digit());
        if is_scheme(scheme) && !port_like {
            rest = after;
        }
    }
    if let Some(after) = rest.strip_prefix("//") {
        let end = after.find(['/', '?', '#']).unwrap_or(after.len());
        rest = &after[end..];
    }
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    &rest[..end]
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Form decoding: `+` is a space, `%XX` an escaped byte. Malformed escapes
/// are kept verbatim; invalid UTF-8 is replaced.
pub fn unquote_plus(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let escaped = bytes
                    .get(i + 1..i + 3)
                    .and_then(|h| Some(hex_val(h[0])? << 4 | hex_val(h[1])?));
                if let Some(byte) = escaped {
                    out.push(byte);
                    i += 3;
                    continue;
                }
                out.push(b'%');
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parse a query string (with or without its leading `?`).
///
/// Pairs are separated by `&` or `;`. Pairs without `=` and pairs with an
/// empty value are dropped.
pub fn parse_query_string(qs: &str) -> QueryString {
    let qs = qs.strip_prefix('?').unwrap_or(qs);
    let mut params = QueryString::new();
    for pair in qs.split(['&', ';']) {
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        params
            .entry(unquote_plus(name))
            .or_default()
            .push(unquote_plus(value));
    }
    params
}
