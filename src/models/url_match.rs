//! Url equivalence used to find an already open tab for a url.
//!
//! Two urls match when they are equal component by component after
//! percent-decoding, with one cosmetic difference ignored: a url without a
//! query or fragment whose path ends in `/` loses exactly one trailing slash.

use std::borrow::Cow;

use url::Url;

/// A url prepared for comparison.
#[derive(Debug, Clone)]
pub enum NormalizedUrl {
    Parsed(Url),
    /// Input that is not an absolute url, kept as decoded text.
    Raw(String),
}

fn decode(component: &str) -> Cow<'_, str> {
    urlencoding::decode(component).unwrap_or(Cow::Borrowed(component))
}

fn strip_trailing_slash(input: &str) -> Cow<'_, str> {
    match input.strip_suffix('/') {
        Some(stripped) => Cow::Owned(stripped.to_string()),
        None => Cow::Borrowed(input),
    }
}

impl NormalizedUrl {
    pub fn parse(input: &str) -> Self {
        match Url::parse(input) {
            Ok(parsed) => {
                if parsed.query().is_none() && parsed.fragment().is_none() && input.ends_with('/') {
                    let chopped = strip_trailing_slash(input);
                    match Url::parse(&chopped) {
                        Ok(reparsed) => NormalizedUrl::Parsed(reparsed),
                        Err(_) => NormalizedUrl::Raw(decode(&chopped).into_owned()),
                    }
                } else {
                    NormalizedUrl::Parsed(parsed)
                }
            }
            Err(_) => {
                let text = if input.contains('?') || input.contains('#') {
                    Cow::Borrowed(input)
                } else {
                    strip_trailing_slash(input)
                };
                NormalizedUrl::Raw(decode(&text).into_owned())
            }
        }
    }

    pub fn matches(&self, other: &NormalizedUrl) -> bool {
        match (self, other) {
            (NormalizedUrl::Parsed(a), NormalizedUrl::Parsed(b)) => {
                a.scheme() == b.scheme()
                    && decode(a.username()) == decode(b.username())
                    && a.password().map(decode) == b.password().map(decode)
                    && a.host_str().map(decode) == b.host_str().map(decode)
                    && a.port() == b.port()
                    && decode(a.path()) == decode(b.path())
                    && a.query().map(decode) == b.query().map(decode)
                    && a.fragment().map(decode) == b.fragment().map(decode)
            }
            (NormalizedUrl::Raw(a), NormalizedUrl::Raw(b)) => a == b,
            _ => false,
        }
    }
}

/// Whether `a` and `b` refer to the same page for tab matching purposes.
pub fn urls_match(a: &str, b: &str) -> bool {
    NormalizedUrl::parse(a).matches(&NormalizedUrl::parse(b))
}
