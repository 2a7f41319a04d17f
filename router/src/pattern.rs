//! Route patterns: literal text with `<name|regex>` placeholders.
//!
//! `/requests/<id|[0-9a-f-]{36}>/votes` compiles to an anchored regex with
//! one named group per placeholder; a path matches only if the whole path
//! does.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;

use crate::error::{Result, RouterError};

/// Placeholder values captured from a matched path.
pub type Params = BTreeMap<String, String>;

#[derive(Clone)]
pub struct RoutePattern {
    source: String,
    regex: Regex,
    names: Vec<String>,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason: String| RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        let mut expression = String::from("^");
        let mut names = Vec::new();
        let mut rest = pattern;
        while let Some(start) = rest.find('<') {
            expression.push_str(&regex::escape(&rest[..start]));
            let end = rest[start..]
                .find('>')
                .map(|offset| start + offset)
                .ok_or_else(|| invalid("unclosed placeholder".into()))?;

            let placeholder = &rest[start + 1..end];
            let (name, sub) = placeholder
                .split_once('|')
                .ok_or_else(|| invalid(format!("placeholder <{}> needs name|regex", placeholder)))?;
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_lowercase() || c == '_') {
                return Err(invalid(format!("placeholder name {:?} must match [a-z_]+", name)));
            }
            if sub.is_empty() {
                return Err(invalid(format!("placeholder {} has an empty regex", name)));
            }
            if names.iter().any(|n| n == name) {
                return Err(invalid(format!("placeholder {} appears twice", name)));
            }

            expression.push_str(&format!("(?P<{}>{})", name, sub));
            names.push(name.to_string());
            rest = &rest[end + 1..];
        }
        expression.push_str(&regex::escape(rest));
        expression.push('$');

        let regex = Regex::new(&expression).map_err(|e| invalid(e.to_string()))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
            names,
        })
    }

    /// Captured parameters if the whole path matches.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let captures = self.regex.captures(path)?;
        Some(
            self.names
                .iter()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|value| (name.clone(), value.as_str().to_string()))
                })
                .collect(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RoutePattern").field(&self.source).finish()
    }
}
