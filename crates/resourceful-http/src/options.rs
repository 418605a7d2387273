//! Call-time options for resource operations.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{ResourceError, Result};

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

/// Options for GET, POST and PUT.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestOptions {
    /// Acceptable response MIME types, sent as the `accept` header.
    #[serde(default, deserialize_with = "one_or_many")]
    pub accept: Vec<String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an acceptable MIME type.
    pub fn accept(mut self, mime_type: impl Into<String>) -> Self {
        self.accept.push(mime_type.into());
        self
    }

    /// Parse from a JSON object such as `{"accept": ["text/html"]}`.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ResourceError::argument(e.to_string()))
    }
}

/// How [`get_body`](crate::Resource::get_body) interprets the body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum ParseAs {
    /// Return the body text as-is.
    #[default]
    None,
    /// Parse the body as JSON.
    Json,
}

impl FromStr for ParseAs {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "json" => Ok(Self::Json),
            _ => Err(ResourceError::argument(format!(
                "unrecognized parser type `{}`",
                s
            ))),
        }
    }
}

impl TryFrom<String> for ParseAs {
    type Error = ResourceError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for ParseAs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Options for [`get_body`](crate::Resource::get_body).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BodyOptions {
    #[serde(default, deserialize_with = "one_or_many")]
    pub accept: Vec<String>,
    #[serde(default)]
    pub parse_as: ParseAs,
}

impl BodyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(mut self, mime_type: impl Into<String>) -> Self {
        self.accept.push(mime_type.into());
        self
    }

    pub fn parse_as(mut self, parse_as: ParseAs) -> Self {
        self.parse_as = parse_as;
        self
    }

    /// Parse from a JSON object such as `{"parse_as": "json"}`.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ResourceError::argument(e.to_string()))
    }

    /// The GET options, without the parser choice.
    pub fn request_options(&self) -> RequestOptions {
        RequestOptions {
            accept: self.accept.clone(),
        }
    }
}

/// A representation returned by [`get_body`](crate::Resource::get_body).
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Raw(String),
    Json(serde_json::Value),
}

impl Body {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Raw(text) => Some(text),
            Self::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Raw(_) => None,
        }
    }
}
