use std::fmt;
use std::str::FromStr;

use pep508_rs::{ExtraName, MarkerEnvironment, MarkerTree, StringVersion};
use serde::{Serialize, Serializer};

use crate::errors::{DependencyError, Result};

/// A parsed environment marker such as `python_version >= "3.8" and sys_platform == "linux"`.
///
/// Construction only parses; evaluation is left to whoever knows the target
/// environment.
#[derive(Debug, Clone)]
pub struct Markers {
    tree: MarkerTree,
}

impl Markers {
    pub fn parse(marker: &str) -> Result<Self> {
        let trimmed = marker.trim();
        MarkerTree::from_str(trimmed)
            .map(|tree| Self { tree })
            .map_err(|err| DependencyError::marker_syntax(trimmed, err))
    }

    /// Evaluates the marker with no extra active.
    #[must_use]
    pub fn evaluate(&self, env: &MarkerEnvironment) -> bool {
        self.tree.evaluate(env, &[])
    }

    /// Evaluates the marker with the given extras active, so `extra == "name"`
    /// clauses can match.
    #[must_use]
    pub fn evaluate_with_extras(&self, env: &MarkerEnvironment, extras: &[&str]) -> bool {
        let extras = extras
            .iter()
            .filter_map(|extra| ExtraName::from_str(extra).ok())
            .collect::<Vec<_>>();
        self.tree.evaluate(env, &extras)
    }
}

impl PartialEq for Markers {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for Markers {}

impl fmt::Display for Markers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tree)
    }
}

impl FromStr for Markers {
    type Err = DependencyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Markers {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Interpreter and platform facts, as plain strings, that markers are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerEnv {
    pub implementation_name: String,
    pub implementation_version: String,
    pub os_name: String,
    pub platform_machine: String,
    pub platform_python_implementation: String,
    pub platform_release: String,
    pub platform_system: String,
    pub platform_version: String,
    pub python_full_version: String,
    pub python_version: String,
    pub sys_platform: String,
}

impl MarkerEnv {
    /// A CPython environment for `python_version` (e.g. `3.11` or `3.11.4`) on
    /// `sys_platform` (`linux`, `darwin`, `win32`, …).
    #[must_use]
    pub fn for_python(python_version: &str, sys_platform: &str) -> Self {
        let python_version = python_version.trim();
        let mut parts = python_version.split('.');
        let major = parts.next().unwrap_or("3");
        let minor = parts.next().unwrap_or("0");
        let patch = parts.next().unwrap_or("0");
        let full = format!("{major}.{minor}.{patch}");
        let (os_name, platform_system) = match sys_platform {
            "win32" | "cygwin" => ("nt", "Windows"),
            "darwin" => ("posix", "Darwin"),
            "linux" => ("posix", "Linux"),
            other => ("posix", other),
        };
        Self {
            implementation_name: "cpython".into(),
            implementation_version: full.clone(),
            os_name: os_name.into(),
            platform_machine: "x86_64".into(),
            platform_python_implementation: "CPython".into(),
            platform_release: String::new(),
            platform_system: platform_system.into(),
            platform_version: String::new(),
            python_full_version: full,
            python_version: format!("{major}.{minor}"),
            sys_platform: sys_platform.into(),
        }
    }

    pub fn to_marker_environment(&self) -> Result<MarkerEnvironment> {
        Ok(MarkerEnvironment {
            implementation_name: self.implementation_name.clone(),
            implementation_version: string_version(
                &self.implementation_version,
                "implementation_version",
            )?,
            os_name: self.os_name.clone(),
            platform_machine: self.platform_machine.clone(),
            platform_python_implementation: self.platform_python_implementation.clone(),
            platform_release: self.platform_release.clone(),
            platform_system: self.platform_system.clone(),
            platform_version: self.platform_version.clone(),
            python_full_version: string_version(&self.python_full_version, "python_full_version")?,
            python_version: string_version(&self.python_version, "python_version")?,
            sys_platform: self.sys_platform.clone(),
        })
    }
}

fn string_version(value: &str, field: &str) -> Result<StringVersion> {
    StringVersion::from_str(value).map_err(|err| {
        DependencyError::parse(
            value,
            format!("`{value}` is not a valid PEP 440 version for `{field}`: {err}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(python: &str, platform: &str) -> MarkerEnvironment {
        MarkerEnv::for_python(python, platform)
            .to_marker_environment()
            .unwrap()
    }

    #[test]
    fn markers_follow_python_version() {
        let marker = Markers::parse(r#"python_version >= "3.6""#).unwrap();
        assert!(marker.evaluate(&env("3.6", "linux")));
        assert!(marker.evaluate(&env("3.12", "linux")));
        assert!(!marker.evaluate(&env("3.5", "linux")));
        assert!(!marker.evaluate(&env("2.7", "linux")));
    }

    #[test]
    fn markers_combine_platform_clauses() {
        let marker =
            Markers::parse(r#"sys_platform == "win32" or (python_version < "3.8" and os_name == "posix")"#)
                .unwrap();
        assert!(marker.evaluate(&env("3.12", "win32")));
        assert!(marker.evaluate(&env("3.7", "linux")));
        assert!(!marker.evaluate(&env("3.12", "darwin")));
    }

    #[test]
    fn extra_clauses_need_an_active_extra() {
        let marker = Markers::parse(r#"extra == "socks""#).unwrap();
        let env = env("3.12", "linux");
        assert!(!marker.evaluate(&env));
        assert!(marker.evaluate_with_extras(&env, &["socks"]));
        assert!(!marker.evaluate_with_extras(&env, &["security"]));
    }

    #[test]
    fn malformed_markers_are_marker_syntax_errors() {
        let err = Markers::parse("python_version >>= '3.6'").unwrap_err();
        assert!(matches!(
            err,
            DependencyError::MarkerSyntax { ref marker, .. } if marker == "python_version >>= '3.6'"
        ));
    }

    #[test]
    fn for_python_fills_full_version() {
        let env = MarkerEnv::for_python("3.11", "darwin");
        assert_eq!(env.python_full_version, "3.11.0");
        assert_eq!(env.python_version, "3.11");
        assert_eq!(env.platform_system, "Darwin");
    }
}
