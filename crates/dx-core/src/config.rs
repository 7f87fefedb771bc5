use std::collections::HashMap;
use std::env;

use dx_domain::{MarkerEnv, RepositoryLocator, DEFAULT_INDEX_NAME, DEFAULT_INDEX_URL};

pub const DEFAULT_PYTHON_VERSION: &str = "3.12";

#[derive(Debug, Clone, Default)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    /// Unset and blank values read the same.
    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub(crate) index: IndexConfig,
    pub(crate) target: TargetConfig,
}

impl Config {
    /// Builds a configuration snapshot from the current process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_snapshot(&EnvSnapshot::capture())
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot) -> Self {
        Self {
            index: IndexConfig {
                name: snapshot
                    .var("DX_INDEX_NAME")
                    .unwrap_or(DEFAULT_INDEX_NAME)
                    .to_string(),
                url: snapshot
                    .var("DX_INDEX_URL")
                    .unwrap_or(DEFAULT_INDEX_URL)
                    .trim_end_matches('/')
                    .to_string(),
            },
            target: TargetConfig {
                python_version: snapshot
                    .var("DX_PYTHON_VERSION")
                    .unwrap_or(DEFAULT_PYTHON_VERSION)
                    .to_string(),
                platform: snapshot
                    .var("DX_PLATFORM")
                    .map_or_else(host_sys_platform, ToOwned::to_owned),
            },
        }
    }

    #[must_use]
    pub fn index(&self) -> &IndexConfig {
        &self.index
    }

    #[must_use]
    pub fn target(&self) -> &TargetConfig {
        &self.target
    }

    /// A locator that sends link-less dependencies to the configured index.
    #[must_use]
    pub fn locator(&self) -> RepositoryLocator {
        RepositoryLocator::with_index(&self.index.name, &self.index.url)
    }

    #[must_use]
    pub fn marker_env(&self) -> MarkerEnv {
        MarkerEnv::for_python(&self.target.python_version, &self.target.platform)
    }

    /// Same configuration with the marker target replaced where given.
    #[must_use]
    pub fn with_target(mut self, python_version: Option<&str>, platform: Option<&str>) -> Self {
        if let Some(version) = python_version {
            self.target.python_version = version.to_string();
        }
        if let Some(platform) = platform {
            self.target.platform = platform.to_string();
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    pub python_version: String,
    /// Value of Python's `sys.platform` on the target.
    pub platform: String,
}

fn host_sys_platform() -> String {
    let platform = match env::consts::OS {
        "macos" => "darwin",
        "windows" => "win32",
        "freebsd" => "freebsd",
        _ => "linux",
    };
    platform.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dx_domain::Repository;

    #[test]
    fn defaults_point_at_pypi() {
        let config = Config::from_snapshot(&EnvSnapshot::testing(&[]));
        assert_eq!(config.index().name, "pypi");
        assert_eq!(config.index().url, "https://pypi.org/simple");
        assert_eq!(config.target().python_version, "3.12");
        assert_eq!(config.locator().default_index(), &Repository::default_index());
    }

    #[test]
    fn env_overrides_index_and_target() {
        let snapshot = EnvSnapshot::testing(&[
            ("DX_INDEX_NAME", "corp"),
            ("DX_INDEX_URL", "https://pkgs.corp.example/simple/"),
            ("DX_PYTHON_VERSION", "3.9"),
            ("DX_PLATFORM", "win32"),
        ]);
        let config = Config::from_snapshot(&snapshot);
        assert_eq!(
            config.locator().default_index(),
            &Repository::Index {
                name: "corp".into(),
                url: "https://pkgs.corp.example/simple".into(),
            }
        );
        let env = config.marker_env();
        assert_eq!(env.python_version, "3.9");
        assert_eq!(env.sys_platform, "win32");
        assert_eq!(env.os_name, "nt");
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let snapshot = EnvSnapshot::testing(&[("DX_INDEX_URL", "  "), ("DX_PLATFORM", "")]);
        let config = Config::from_snapshot(&snapshot);
        assert_eq!(config.index().url, DEFAULT_INDEX_URL);
        assert_eq!(config.target().platform, host_sys_platform());
    }

    #[test]
    fn with_target_overrides_only_given_fields() {
        let config = Config::from_snapshot(&EnvSnapshot::testing(&[("DX_PLATFORM", "darwin")]))
            .with_target(Some("3.8"), None);
        assert_eq!(config.target().python_version, "3.8");
        assert_eq!(config.target().platform, "darwin");
    }
}
