//! `Set-Cookie` parsing and rewriting.
//!
//! Grammar (RFC 6265 §4.1.1, parsed leniently as in §5.2):
//!
//! ```text
//! set-cookie-string = cookie-pair *( ";" cookie-av )
//! cookie-av         = [ WSP ] av-name [ "=" av-value ] [ WSP ]
//! ```
//!
//! - Every `;` ends an attribute. There is no quoting: `Path="/a;b"` is the
//!   attribute `Path="/a` followed by the attribute `b"`.
//! - Attribute names are compared case-insensitively after trimming.
//! - The cookie pair and untouched attributes keep their original bytes,
//!   including surrounding whitespace. Empty attribute segments are dropped.

use std::borrow::Cow;
use std::fmt;

/// One `;`-separated attribute, kept as the raw text after the `;`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieAttribute<'a> {
    raw: &'a str,
}

impl<'a> CookieAttribute<'a> {
    pub fn name(&self) -> &'a str {
        match self.raw.split_once('=') {
            Some((name, _)) => name.trim(),
            None => self.raw.trim(),
        }
    }

    pub fn value(&self) -> Option<&'a str> {
        self.raw.split_once('=').map(|(_, value)| value.trim())
    }

    pub fn is(&self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name)
    }
}

/// A parsed `Set-Cookie` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie<'a> {
    pair: &'a str,
    attributes: Vec<CookieAttribute<'a>>,
}

impl<'a> SetCookie<'a> {
    pub fn parse(value: &'a str) -> Self {
        let mut segments = value.split(';');
        let pair = segments.next().unwrap_or_default();
        let attributes = segments
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| CookieAttribute { raw })
            .collect();
        Self { pair, attributes }
    }

    /// The `name=value` part, untrimmed.
    pub fn pair(&self) -> &'a str {
        self.pair
    }

    pub fn attributes(&self) -> &[CookieAttribute<'a>] {
        &self.attributes
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.is(name))
    }

    /// Remove every attribute with this name. Returns true if any was removed.
    pub fn remove_attribute(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|a| !a.is(name));
        self.attributes.len() != before
    }

    /// Append an attribute, serialized as `;<raw>`. Include any leading space in `raw`.
    pub fn push_attribute(&mut self, raw: &'a str) {
        self.attributes.push(CookieAttribute { raw });
    }
}

impl fmt::Display for SetCookie<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pair)?;
        for attribute in &self.attributes {
            write!(f, ";{}", attribute.raw)?;
        }
        Ok(())
    }
}

/// Scope an upstream cookie to the proxy's own origin.
///
/// Drops every `Domain` attribute so the cookie defaults to the proxy host,
/// and adds `Path=/` when no `Path` is present. Values that need neither
/// change are returned as-is.
pub fn rewrite_set_cookie(value: &str) -> Cow<'_, str> {
    let mut cookie = SetCookie::parse(value);
    let removed_domain = cookie.remove_attribute("domain");
    let missing_path = !cookie.has_attribute("path");

    if !removed_domain && !missing_path {
        return Cow::Borrowed(value);
    }
    if missing_path {
        cookie.push_attribute(" Path=/");
    }
    Cow::Owned(cookie.to_string())
}
