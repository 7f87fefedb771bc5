use std::fmt;
use std::sync::Arc;

use pep440_rs::Version;
use pep508_rs::MarkerEnvironment;
use serde::Serialize;

use crate::constraint::Constraint;
use crate::links::Link;
use crate::markers::Markers;
use crate::names::canonicalize_package_name;
use crate::repository::Repository;

/// Extra fields a caller can attach when rebuilding a dependency from a
/// lockfile or converter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyInfo {
    /// Version an earlier resolution settled on.
    pub locked_version: Option<Version>,
    pub hashes: Vec<String>,
    pub platforms: Vec<String>,
    /// Named groups the dependency belongs to (`main`, `dev`, …).
    pub envs: Vec<String>,
    pub description: Option<String>,
}

/// Package X, as required, under these conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub raw_name: String,
    pub constraint: Constraint,
    pub repo: Repository,
    pub link: Option<Link>,
    /// `None` means the dependency always applies.
    pub marker: Option<Markers>,
    pub editable: bool,
    pub info: DependencyInfo,
}

impl Dependency {
    /// A bare dependency on the default index with no restriction, typically
    /// the root project that requires everything else.
    #[must_use]
    pub fn root(raw_name: impl Into<String>) -> Self {
        Self {
            raw_name: raw_name.into(),
            constraint: Constraint::default(),
            repo: Repository::default_index(),
            link: None,
            marker: None,
            editable: false,
            info: DependencyInfo::default(),
        }
    }

    /// Canonical name used for comparison and deduplication.
    #[must_use]
    pub fn name(&self) -> String {
        canonicalize_package_name(&self.raw_name)
    }

    /// Whether the dependency applies in `env`. Markers are only evaluated here,
    /// never during construction.
    #[must_use]
    pub fn applies_to(&self, env: &MarkerEnvironment) -> bool {
        self.marker.as_ref().is_none_or(|marker| marker.evaluate(env))
    }

    #[must_use]
    pub fn is_vcs_pinned(&self) -> bool {
        self.link.as_ref().and_then(Link::pinned_revision).is_some()
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_name)?;
        let constraint = self.constraint.to_string();
        if !constraint.is_empty() {
            write!(f, " {constraint}")?;
        }
        if let Some(marker) = &self.marker {
            write!(f, " ; {marker}")?;
        }
        Ok(())
    }
}

/// The optional-feature set `extra` of a base dependency.
///
/// Selecting the base with this extra activates sub-requirements that are
/// discovered later from the resolved package's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraDependency {
    base: Arc<Dependency>,
    extra: String,
}

impl ExtraDependency {
    #[must_use]
    pub fn new(base: Arc<Dependency>, extra: impl Into<String>) -> Self {
        Self {
            base,
            extra: extra.into(),
        }
    }

    #[must_use]
    pub fn base(&self) -> &Arc<Dependency> {
        &self.base
    }

    #[must_use]
    pub fn extra(&self) -> &str {
        &self.extra
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.base.name()
    }

    #[must_use]
    pub fn link(&self) -> Option<&Link> {
        self.base.link.as_ref()
    }

    #[must_use]
    pub fn repo(&self) -> &Repository {
        &self.base.repo
    }

    /// Extras to activate when evaluating markers under this dependency.
    #[must_use]
    pub fn marker_extras(&self) -> [&str; 1] {
        [self.extra.as_str()]
    }
}

impl fmt::Display for ExtraDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.base.raw_name, self.extra)
    }
}

/// One element of a construction result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyNode {
    Base(Arc<Dependency>),
    Extra(ExtraDependency),
}

impl DependencyNode {
    /// The base dependency this node belongs to (itself for a base node).
    #[must_use]
    pub fn dependency(&self) -> &Arc<Dependency> {
        match self {
            Self::Base(dep) => dep,
            Self::Extra(extra) => extra.base(),
        }
    }

    #[must_use]
    pub fn extra(&self) -> Option<&str> {
        match self {
            Self::Base(_) => None,
            Self::Extra(extra) => Some(extra.extra()),
        }
    }

    #[must_use]
    pub fn as_base(&self) -> Option<&Arc<Dependency>> {
        match self {
            Self::Base(dep) => Some(dep),
            Self::Extra(_) => None,
        }
    }

    #[must_use]
    pub fn as_extra(&self) -> Option<&ExtraDependency> {
        match self {
            Self::Base(_) => None,
            Self::Extra(extra) => Some(extra),
        }
    }

    #[must_use]
    pub fn summary(&self) -> NodeSummary {
        let dep = self.dependency();
        NodeSummary {
            raw_name: dep.raw_name.clone(),
            name: dep.name(),
            extra: self.extra().map(ToString::to_string),
            constraint: dep.constraint.to_string(),
            git_pinned: dep.constraint.is_git_pinned(),
            requirers: dep.constraint.sources().map(ToString::to_string).collect(),
            repo: dep.repo.clone(),
            link: dep.link.clone(),
            marker: dep.marker.as_ref().map(ToString::to_string),
            editable: dep.editable,
            locked_version: dep.info.locked_version.as_ref().map(ToString::to_string),
        }
    }
}

impl fmt::Display for DependencyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base(dep) => write!(f, "{dep}"),
            Self::Extra(extra) => write!(f, "{extra}"),
        }
    }
}

/// Flat, serializable view of a node for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSummary {
    pub raw_name: String,
    pub name: String,
    pub extra: Option<String>,
    pub constraint: String,
    pub git_pinned: bool,
    pub requirers: Vec<String>,
    pub repo: Repository,
    pub link: Option<Link>,
    pub marker: Option<String>,
    pub editable: bool,
    pub locked_version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::MarkerEnv;

    #[test]
    fn root_dependency_always_applies() {
        let root = Dependency::root("My_App");
        assert_eq!(root.name(), "my-app");
        let env = MarkerEnv::for_python("3.12", "linux")
            .to_marker_environment()
            .unwrap();
        assert!(root.applies_to(&env));
        assert!(!root.is_vcs_pinned());
    }

    #[test]
    fn extra_dependency_shares_base_identity() {
        let base = Arc::new(Dependency::root("Requests"));
        let extra = ExtraDependency::new(Arc::clone(&base), "socks");
        assert_eq!(extra.name(), "requests");
        assert_eq!(extra.to_string(), "Requests[socks]");
        assert!(Arc::ptr_eq(extra.base(), &base));
        assert_eq!(extra.repo(), &base.repo);
        assert_eq!(extra.link(), None);
        assert_eq!(extra.marker_extras(), ["socks"]);
    }

    #[test]
    fn extra_dependency_exposes_the_base_link() {
        let link = crate::links::parse_link(Some("git+https://github.com/psf/requests.git@v2.31.0"))
            .unwrap()
            .unwrap();
        let mut dep = Dependency::root("requests");
        dep.link = Some(link.clone());
        let extra = ExtraDependency::new(Arc::new(dep), "socks");
        assert_eq!(extra.link(), Some(&link));
        assert_eq!(extra.link().and_then(Link::pinned_revision), Some("v2.31.0"));
    }

    #[test]
    fn summary_reports_extra_and_requirers() {
        let base = Arc::new(Dependency::root("demo"));
        let node = DependencyNode::Extra(ExtraDependency::new(base, "cli"));
        let summary = node.summary();
        assert_eq!(summary.extra.as_deref(), Some("cli"));
        assert!(summary.requirers.is_empty());
        assert_eq!(summary.repo.kind(), "index");
    }
}
