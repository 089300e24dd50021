//! Path patterns
//!
//! Patterns use `:name` placeholders for whole segments, e.g. `/notes/:id`.
//! Each pattern compiles to an anchored regular expression.

use crate::error::{BindError, Result};
use regex::Regex;
use std::collections::HashMap;

/// Values captured from placeholder segments, percent-decoded
pub type PathParams = HashMap<String, String>;

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    regex: Regex,
    names: Vec<String>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason: &str| BindError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if !pattern.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let mut names: Vec<String> = Vec::new();
        let mut source = String::from("^");
        for segment in pattern.split('/').skip(1) {
            source.push('/');
            match segment.strip_prefix(':') {
                Some(name) => {
                    if name.is_empty()
                        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                    {
                        return Err(invalid("placeholder names must be alphanumeric"));
                    }
                    if names.iter().any(|existing| existing == name) {
                        return Err(invalid("placeholder names must be unique"));
                    }
                    source.push_str(&format!("(?P<{name}>[^/]+)"));
                    names.push(name.to_string());
                }
                None => source.push_str(&regex::escape(segment)),
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| invalid(&e.to_string()))?;
        Ok(Self {
            raw: pattern.to_string(),
            regex,
            names,
        })
    }

    /// The pattern as registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in order of appearance.
    pub fn placeholders(&self) -> &[String] {
        &self.names
    }

    /// Match `path`, returning captured placeholder values.
    pub fn captures(&self, path: &str) -> Option<PathParams> {
        let captures = self.regex.captures(path)?;
        let mut params = PathParams::new();
        for name in &self.names {
            let raw = captures.name(name)?.as_str();
            let value = urlencoding::decode(raw).ok()?.into_owned();
            params.insert(name.clone(), value);
        }
        Some(params)
    }
}
