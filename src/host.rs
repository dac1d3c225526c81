//! Helpers for turning user input into something `resolve` accepts.
//!
//! None of these are applied by [`SuffixList::resolve`](crate::SuffixList::resolve)
//! itself; callers pick the ones that fit their input.

use std::borrow::Cow;

use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Characters that never appear in a host name
static INVALID_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[!@#$%^&*()_+=\\/,|'"]"#).expect("INVALID_CHARS: hardcoded regex is invalid")
});

/// Host part of a URL, or `None` when `input` is not a URL with a host.
///
/// Bare domains such as `example.com` are not URLs and give `None`.
pub fn extract_host(input: &str) -> Option<String> {
    let url = Url::parse(input).ok()?;
    url.host_str()
        .filter(|host| !host.is_empty())
        .map(|host| host.trim_start_matches('[').trim_end_matches(']').to_string())
}

/// Punycode form of `input` when it contains non-ASCII characters.
///
/// ASCII input is returned unchanged (casing included). Returns `None`
/// when IDNA conversion fails.
pub fn encode_input(input: &str) -> Option<Cow<'_, str>> {
    if input.is_ascii() {
        return Some(Cow::Borrowed(input));
    }
    match idna::domain_to_ascii(input) {
        Ok(ascii) => Some(Cow::Owned(ascii)),
        Err(e) => {
            trace!("IDNA conversion of '{}' failed: {:?}", input, e);
            None
        }
    }
}

/// Cursory syntax check: at least four characters, at least one dot and
/// none of the characters that cannot occur in a host name.
pub fn is_domain_valid(domain: &str) -> bool {
    domain.chars().count() >= 4 && domain.contains('.') && !INVALID_CHARS.is_match(domain)
}
