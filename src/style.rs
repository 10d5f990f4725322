use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// How a record is rendered before publishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Style {
    /// The record's full layout rendering: timestamp, level, module, location.
    #[default]
    Formatted,
    /// Only the message text.
    Minimal,
    /// A JSON [`LogMessage`](crate::message::LogMessage).
    Structured,
}

impl Style {
    pub const FORMATTED: &'static str = "FORMATTED";
    pub const MINIMAL: &'static str = "MINIMAL";
    pub const JSON: &'static str = "JSON";

    /// Resolve a configuration token. Matching ignores ASCII case and
    /// surrounding whitespace; anything unrecognized, including the empty
    /// string, selects [`Style::Formatted`].
    pub fn from_token(token: &str) -> Style {
        let token = token.trim();
        if token.eq_ignore_ascii_case(Self::JSON) {
            Style::Structured
        } else if token.eq_ignore_ascii_case(Self::MINIMAL) {
            Style::Minimal
        } else {
            Style::Formatted
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Style::Formatted => Self::FORMATTED,
            Style::Minimal => Self::MINIMAL,
            Style::Structured => Self::JSON,
        }
    }
}

impl FromStr for Style {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Style::from_token(s))
    }
}

impl From<String> for Style {
    fn from(token: String) -> Self {
        Style::from_token(&token)
    }
}

impl From<Style> for String {
    fn from(style: Style) -> Self {
        style.token().to_string()
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
