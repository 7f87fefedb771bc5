//! Version constraints that remember which requirer asked for what.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use pep440_rs::{Version, VersionSpecifiers};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::errors::{DependencyError, Result};

/// Slot key used when a constraint was built without a requirer.
const ANONYMOUS: &str = "";

/// One requirer's demand on a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Specifier {
    /// A PEP 440 range such as `>=1.0,<2.0`. Empty means "any version".
    Range(VersionSpecifiers),
    /// Exactly the VCS state the link points at. Overrides any range.
    Git,
}

impl Specifier {
    /// Parses version-specifier text; blank text is the unrestricted range.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Self::any());
        }
        VersionSpecifiers::from_str(trimmed)
            .map(Self::Range)
            .map_err(|err| DependencyError::parse(trimmed, err))
    }

    #[must_use]
    pub fn any() -> Self {
        Self::Range(VersionSpecifiers::from_iter(std::iter::empty()))
    }

    #[must_use]
    pub fn is_git(&self) -> bool {
        matches!(self, Self::Git)
    }
}

impl From<VersionSpecifiers> for Specifier {
    fn from(specifiers: VersionSpecifiers) -> Self {
        Self::Range(specifiers)
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range(specifiers) => write!(f, "{specifiers}"),
            Self::Git => f.write_str("git"),
        }
    }
}

/// Merges an incoming demand into an existing slot.
///
/// A Git pin is never loosened by a range; an incoming Git pin always wins.
/// Two ranges combine into their conjunction.
#[must_use]
pub fn narrow(existing: Option<&Specifier>, incoming: Specifier) -> Specifier {
    match (existing, incoming) {
        (Some(Specifier::Git), _) | (_, Specifier::Git) => Specifier::Git,
        (None, incoming) => incoming,
        (Some(Specifier::Range(current)), Specifier::Range(extra)) => {
            Specifier::Range(conjunction([current, &extra]))
        }
    }
}

fn conjunction<'a>(sets: impl IntoIterator<Item = &'a VersionSpecifiers>) -> VersionSpecifiers {
    let mut merged = Vec::new();
    for specifier in sets.into_iter().flat_map(|set| set.iter()) {
        if !merged.contains(specifier) {
            merged.push(specifier.clone());
        }
    }
    merged.into_iter().collect()
}

/// An accumulating version restriction on one package, keyed by the name of
/// each requirer that contributed to it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Constraint {
    specs: IndexMap<String, Specifier>,
}

impl Constraint {
    /// A constraint holding `specifier` as demanded by `source`.
    #[must_use]
    pub fn new(source: &str, specifier: Specifier) -> Self {
        let mut specs = IndexMap::new();
        specs.insert(source.to_string(), specifier);
        Self { specs }
    }

    /// A finished range with no requirer attached.
    #[must_use]
    pub fn anonymous(specifier: Specifier) -> Self {
        Self::new(ANONYMOUS, specifier)
    }

    /// Replaces `source`'s slot with the Git pin, whatever it held before.
    pub fn pin_git(&mut self, source: &str) {
        self.specs.insert(source.to_string(), Specifier::Git);
    }

    /// Folds another requirer's demand into this constraint through [`narrow`].
    pub fn merge(&mut self, source: &str, incoming: Specifier) {
        let merged = narrow(self.specs.get(source), incoming);
        self.specs.insert(source.to_string(), merged);
    }

    /// Folds every slot of `other` into this constraint.
    pub fn absorb(&mut self, other: &Constraint) {
        for (source, specifier) in &other.specs {
            self.merge(source, specifier.clone());
        }
    }

    #[must_use]
    pub fn get(&self, source: &str) -> Option<&Specifier> {
        self.specs.get(source)
    }

    /// Names of the requirers that contributed, in insertion order.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.specs
            .keys()
            .map(String::as_str)
            .filter(|source| *source != ANONYMOUS)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Specifier)> {
        self.specs.iter().map(|(source, spec)| (source.as_str(), spec))
    }

    #[must_use]
    pub fn is_git_pinned(&self) -> bool {
        self.specs.values().any(Specifier::is_git)
    }

    /// Intersection of every range slot; Git slots contribute nothing.
    #[must_use]
    pub fn specifiers(&self) -> VersionSpecifiers {
        conjunction(self.specs.values().filter_map(|spec| match spec {
            Specifier::Range(range) => Some(range),
            Specifier::Git => None,
        }))
    }

    /// Whether `version` satisfies every requirer. A Git pin defers to the VCS
    /// state, so only range slots are checked.
    #[must_use]
    pub fn contains(&self, version: &Version) -> bool {
        self.specs.values().all(|spec| match spec {
            Specifier::Range(range) => range.contains(version),
            Specifier::Git => true,
        })
    }
}

impl FromStr for Constraint {
    type Err = DependencyError;

    fn from_str(s: &str) -> Result<Self> {
        Specifier::parse(s).map(Self::anonymous)
    }
}

impl From<VersionSpecifiers> for Constraint {
    fn from(specifiers: VersionSpecifiers) -> Self {
        Self::anonymous(Specifier::Range(specifiers))
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_git_pinned() {
            f.write_str("git")
        } else {
            write!(f, "{}", self.specifiers())
        }
    }
}

impl Serialize for Constraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.specs.len()))?;
        for (source, spec) in self.iter() {
            let key = if source == ANONYMOUS { "*" } else { source };
            map.serialize_entry(key, &spec.to_string())?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(text: &str) -> Specifier {
        Specifier::parse(text).unwrap()
    }

    fn version(text: &str) -> Version {
        Version::from_str(text).unwrap()
    }

    #[test]
    fn blank_specifier_is_unrestricted() {
        let constraint = Constraint::new("app", range("  "));
        assert!(constraint.contains(&version("0.0.1")));
        assert!(constraint.contains(&version("99.0")));
        assert!(!constraint.is_git_pinned());
    }

    #[test]
    fn invalid_specifier_is_parse_error() {
        let err = Specifier::parse(">=1.0,<<2").unwrap_err();
        assert!(matches!(err, DependencyError::Parse { ref input, .. } if input == ">=1.0,<<2"));
    }

    #[test]
    fn merge_intersects_ranges_per_source() {
        let mut constraint = Constraint::new("app", range(">=1.0"));
        constraint.merge("lib", range("<2.0"));
        constraint.merge("app", range("!=1.5"));
        assert_eq!(constraint.sources().collect::<Vec<_>>(), vec!["app", "lib"]);
        assert!(constraint.contains(&version("1.4")));
        assert!(!constraint.contains(&version("1.5")));
        assert!(!constraint.contains(&version("2.0")));
        assert!(!constraint.contains(&version("0.9")));
        assert_eq!(constraint.specifiers().iter().count(), 3);
    }

    #[test]
    fn git_pin_is_never_narrowed_by_a_range() {
        let mut constraint = Constraint::new("app", range(">=1.0,<2.0"));
        constraint.pin_git("app");
        constraint.merge("app", range("==1.2"));
        assert_eq!(constraint.get("app"), Some(&Specifier::Git));
        assert!(constraint.is_git_pinned());
        assert_eq!(constraint.to_string(), "git");
    }

    #[test]
    fn incoming_git_pin_replaces_range() {
        assert_eq!(narrow(Some(&range("==1.0")), Specifier::Git), Specifier::Git);
        assert_eq!(narrow(None, range(">=3")), range(">=3"));
    }

    #[test]
    fn absorb_keeps_every_requirer() {
        let mut left = Constraint::new("a", range(">=1"));
        let right = Constraint::new("b", Specifier::Git);
        left.absorb(&right);
        assert_eq!(left.sources().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(
            left.iter().collect::<Vec<_>>(),
            vec![("a", &range(">=1")), ("b", &Specifier::Git)]
        );
        assert!(left.is_git_pinned());
        let json = serde_json::to_value(&left).unwrap();
        assert_eq!(json["b"], "git");
    }

    #[test]
    fn anonymous_slot_is_hidden_from_sources() {
        let constraint = Constraint::from_str(">=1.0,<2.0").unwrap();
        assert_eq!(constraint.sources().count(), 0);
        assert_eq!(
            constraint.specifiers(),
            VersionSpecifiers::from_str(">=1.0,<2.0").unwrap()
        );
        let json = serde_json::to_value(&constraint).unwrap();
        assert!(json.get("*").is_some());
    }
}
