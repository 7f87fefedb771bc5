use std::str::FromStr;

use pep508_rs::{Requirement as PepRequirement, VersionOrUrl};
use serde::Serialize;

use crate::errors::{DependencyError, Result};
use crate::names::canonicalize_package_name;

/// A requirement broken into the pieces construction needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedRequirement {
    /// Name as written (case and separators preserved).
    pub name: String,
    /// Version-specifier text; empty when the requirement has none.
    pub specifier: String,
    /// Extras in the order they were listed, without duplicates.
    pub extras: Vec<String>,
    pub marker: Option<String>,
    pub url: Option<String>,
}

impl ParsedRequirement {
    /// Parses PEP 508 text such as `pkg[extra]>=1.0 ; python_version >= "3.8"` or
    /// `pkg @ git+https://host/org/pkg@v1`.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = strip_wrapping_quotes(text.trim());
        let requirement = PepRequirement::from_str(trimmed)
            .map_err(|err| DependencyError::parse(trimmed, err))?;
        let mut parsed = Self::from_pep(&requirement);
        let written = written_name(trimmed);
        if canonicalize_package_name(written) == canonicalize_package_name(&parsed.name) {
            parsed.name = written.to_string();
        }
        Ok(parsed)
    }

    /// `pep508_rs` normalizes the name, so callers restore the written one.
    fn from_pep(requirement: &PepRequirement) -> Self {
        let (specifier, url) = match requirement.version_or_url.as_ref() {
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => (specifiers.to_string(), None),
            Some(VersionOrUrl::Url(url)) => (String::new(), Some(url.to_string())),
            None => (String::new(), None),
        };
        let mut extras: Vec<String> = Vec::with_capacity(requirement.extras.len());
        for extra in &requirement.extras {
            let extra = extra.to_string();
            if !extras.contains(&extra) {
                extras.push(extra);
            }
        }
        Self {
            name: requirement.name.to_string(),
            specifier,
            extras,
            marker: requirement.marker.as_ref().map(ToString::to_string),
            url,
        }
    }
}

impl FromStr for ParsedRequirement {
    type Err = DependencyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Either raw requirement text or an already parsed requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementInput {
    Text(String),
    Parsed(ParsedRequirement),
}

impl RequirementInput {
    pub fn into_parsed(self) -> Result<ParsedRequirement> {
        match self {
            Self::Text(text) => ParsedRequirement::parse(&text),
            Self::Parsed(parsed) => Ok(parsed),
        }
    }
}

impl From<&str> for RequirementInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for RequirementInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<ParsedRequirement> for RequirementInput {
    fn from(parsed: ParsedRequirement) -> Self {
        Self::Parsed(parsed)
    }
}

fn written_name(spec: &str) -> &str {
    let end = spec
        .find(|ch: char| !(ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.')))
        .unwrap_or(spec.len());
    &spec[..end]
}

fn strip_wrapping_quotes(input: &str) -> &str {
    if input.len() >= 2 {
        let bytes = input.as_bytes();
        let first = bytes[0];
        let last = bytes[input.len() - 1];
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &input[1..input.len() - 1];
        }
    }
    input
}
