//! Request URLs: URI canonicalization and the query grammar.
//!
//! ```text
//! ?req=header
//! ?var=<urlencoded name>[(<start:stop[:stride]>[,...])]
//! ```

use std::fmt;

use ncstream_core::Section;
use url::form_urlencoded;

use crate::error::RequestError;

/// Scheme prefix of canonical dataset locations.
pub const SCHEME: &str = "ncremote:";

/// HTTP base URL for a dataset URI.
///
/// A leading `ncremote:` is stripped. `http:` and `https:` URIs are kept as
/// they are and anything else is treated as scheme-relative HTTP.
pub fn request_base(uri: &str) -> String {
    let stripped = uri.strip_prefix(SCHEME).unwrap_or(uri);
    if stripped.starts_with("http:") || stripped.starts_with("https:") {
        stripped.to_string()
    } else {
        format!("http:{stripped}")
    }
}

/// Canonical location reported for a dataset served from `base`.
pub fn canonical_location(base: &str) -> String {
    format!("{SCHEME}{base}")
}

/// One request against a dataset base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `req=header`: the schema response.
    Header,
    /// `var=name[(section)]`: a data response. The whole section is sent
    /// without parentheses.
    Variable { name: String, section: Section },
}

impl Request {
    pub fn variable(name: impl Into<String>, section: Section) -> Self {
        Self::Variable {
            name: name.into(),
            section,
        }
    }

    /// Query string without the leading `?`.
    pub fn to_query(&self) -> String {
        match self {
            Self::Header => "req=header".to_string(),
            Self::Variable { name, section } => {
                let encoded: String = form_urlencoded::byte_serialize(name.as_bytes()).collect();
                if section.is_whole() {
                    format!("var={encoded}")
                } else {
                    format!("var={encoded}({section})")
                }
            }
        }
    }

    pub fn url(&self, base: &str) -> String {
        format!("{base}?{}", self.to_query())
    }

    /// Parse a request URL or bare query string.
    pub fn parse(text: &str) -> Result<Self, RequestError> {
        let query = text.split_once('?').map_or(text, |(_, query)| query);
        let unrecognized = || RequestError::Unrecognized(text.to_string());

        if query == "req=header" {
            return Ok(Self::Header);
        }
        let value = query.strip_prefix("var=").ok_or_else(unrecognized)?;

        // The encoded name never contains a raw '('.
        let (raw_name, section) = match value.split_once('(') {
            Some((raw_name, rest)) => {
                let ranges = rest.strip_suffix(')').ok_or_else(unrecognized)?;
                (raw_name, ranges.parse::<Section>()?)
            }
            None => (value, Section::whole()),
        };
        let name = form_urlencoded::parse(raw_name.as_bytes())
            .next()
            .map(|(name, _)| name.into_owned())
            .filter(|name| !name.is_empty())
            .ok_or_else(unrecognized)?;

        Ok(Self::Variable { name, section })
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.to_query())
    }
}
