//! Endpoint selectors used by enable/disable toggles.
//!
//! Route directives such as `?mock=sessions,messages` name endpoints loosely,
//! so a toggle may carry either a full endpoint key or a bare path fragment.

use crate::endpoint::EndpointKey;
use crate::error::{Error, Result};
use crate::matcher::{ApiRequest, matches};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What an endpoint toggle applies to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EndpointSelector {
    /// A full `METHOD /path` key, matched with [`matches`]
    Key(EndpointKey),
    /// A bare fragment, matched as a substring of the request path
    Fragment(String),
}

impl EndpointSelector {
    /// Parse a selector. Text containing whitespace must be a full endpoint key.
    ///
    /// # Errors
    /// Returns an error for empty text or an invalid endpoint key.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("endpoint selector is empty".to_owned()));
        }
        if trimmed.contains(char::is_whitespace) {
            return EndpointKey::parse(trimmed).map(Self::Key);
        }
        Ok(Self::Fragment(trimmed.to_owned()))
    }

    /// Whether this selector covers `request`
    pub fn applies_to(&self, request: &ApiRequest) -> bool {
        match self {
            Self::Key(key) => matches(key, request).is_some(),
            Self::Fragment(fragment) => request.path().contains(fragment.as_str()),
        }
    }
}

impl From<EndpointKey> for EndpointSelector {
    fn from(key: EndpointKey) -> Self {
        Self::Key(key)
    }
}

impl fmt::Display for EndpointSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{key}"),
            Self::Fragment(fragment) => f.write_str(fragment),
        }
    }
}

impl FromStr for EndpointSelector {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        Self::parse(text)
    }
}

impl TryFrom<String> for EndpointSelector {
    type Error = Error;

    fn try_from(text: String) -> Result<Self> {
        Self::parse(&text)
    }
}

impl From<EndpointSelector> for String {
    fn from(selector: EndpointSelector) -> Self {
        selector.to_string()
    }
}
