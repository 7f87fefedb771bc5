//! Turns requirements into dependency records.
//!
//! Both entry points run the same pipeline: classify the link, build the
//! constraint (letting a pinned VCS revision override any range), parse the
//! marker, pick the repository, assemble the base dependency and then derive
//! one extra dependency per listed extra. Nothing here performs I/O or mutates
//! the requiring `source`.

use std::sync::Arc;

use pep440_rs::VersionSpecifiers;
use tracing::debug;

use crate::constraint::{Constraint, Specifier};
use crate::dependency::{Dependency, DependencyInfo, DependencyNode, ExtraDependency};
use crate::errors::Result;
use crate::links::{parse_link, Link};
use crate::markers::Markers;
use crate::names::is_likely_generated_name;
use crate::repository::{Repository, RepositoryLocator};
use crate::requirement::RequirementInput;

/// Decides what node values a construction returns.
pub trait NodeFactory {
    type Node;

    fn base(&self, dep: Arc<Dependency>) -> Self::Node;

    fn extra(&self, base: &Arc<Dependency>, extra: &str) -> Self::Node;
}

/// Produces [`DependencyNode`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNodes;

impl NodeFactory for DefaultNodes {
    type Node = DependencyNode;

    fn base(&self, dep: Arc<Dependency>) -> DependencyNode {
        DependencyNode::Base(dep)
    }

    fn extra(&self, base: &Arc<Dependency>, extra: &str) -> DependencyNode {
        DependencyNode::Extra(ExtraDependency::new(Arc::clone(base), extra))
    }
}

/// A version restriction handed to [`DependencyMaker::from_params`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintValue {
    Text(String),
    Specifiers(VersionSpecifiers),
    /// A constraint that is already complete, e.g. carried over from an earlier
    /// graph. Its requirer slots are kept as they are.
    Built(Constraint),
}

impl ConstraintValue {
    /// Binds the value to `source`. A built constraint keeps every requirer
    /// slot it already has, and `source` joins with an unrestricted slot.
    fn bind(self, source: &Dependency, link: Option<&Link>) -> Result<Constraint> {
        match self {
            Self::Text(text) => Ok(bind_constraint(source, Specifier::parse(&text)?, link)),
            Self::Specifiers(specifiers) => {
                Ok(bind_constraint(source, Specifier::Range(specifiers), link))
            }
            Self::Built(carried) => {
                let mut bound = bind_constraint(source, Specifier::any(), link);
                bound.absorb(&carried);
                Ok(bound)
            }
        }
    }

    fn into_constraint(self) -> Result<Constraint> {
        match self {
            Self::Text(text) => Specifier::parse(&text).map(Constraint::anonymous),
            Self::Specifiers(specifiers) => Ok(Constraint::from(specifiers)),
            Self::Built(constraint) => Ok(constraint),
        }
    }
}

impl From<&str> for ConstraintValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ConstraintValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<VersionSpecifiers> for ConstraintValue {
    fn from(specifiers: VersionSpecifiers) -> Self {
        Self::Specifiers(specifiers)
    }
}

impl From<Constraint> for ConstraintValue {
    fn from(constraint: Constraint) -> Self {
        Self::Built(constraint)
    }
}

/// Discrete inputs for [`DependencyMaker::from_params`], as found in lockfiles
/// and converter output.
#[derive(Debug, Clone)]
pub struct DependencyParams<'a> {
    pub raw_name: String,
    pub constraint: ConstraintValue,
    pub url: Option<String>,
    pub source: Option<&'a Dependency>,
    /// Trusted verbatim when set; otherwise the repository is located from the link.
    pub repo: Option<Repository>,
    pub marker: Option<String>,
    pub extras: Vec<String>,
    pub editable: bool,
    pub info: DependencyInfo,
}

impl<'a> DependencyParams<'a> {
    pub fn new(raw_name: impl Into<String>, constraint: impl Into<ConstraintValue>) -> Self {
        Self {
            raw_name: raw_name.into(),
            constraint: constraint.into(),
            url: None,
            source: None,
            repo: None,
            marker: None,
            extras: Vec::new(),
            editable: false,
            info: DependencyInfo::default(),
        }
    }

    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn source(mut self, source: &'a Dependency) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn repo(mut self, repo: Repository) -> Self {
        self.repo = Some(repo);
        self
    }

    #[must_use]
    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    #[must_use]
    pub fn extras<I, S>(mut self, extras: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extras = extras.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    #[must_use]
    pub fn info(mut self, info: DependencyInfo) -> Self {
        self.info = info;
        self
    }
}

/// The dependency construction core.
#[derive(Debug, Clone, Default)]
pub struct DependencyMaker<F = DefaultNodes> {
    locator: RepositoryLocator,
    factory: F,
}

impl DependencyMaker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_locator(locator: RepositoryLocator) -> Self {
        Self {
            locator,
            factory: DefaultNodes,
        }
    }
}

impl<F: NodeFactory> DependencyMaker<F> {
    /// Swaps the node factory, keeping the repository locator.
    pub fn with_factory<G: NodeFactory>(self, factory: G) -> DependencyMaker<G> {
        DependencyMaker {
            locator: self.locator,
            factory,
        }
    }

    #[must_use]
    pub fn locator(&self) -> &RepositoryLocator {
        &self.locator
    }

    /// Builds nodes for a requirement demanded by `source`.
    ///
    /// `url`, when given, replaces any URL written in the requirement. The first
    /// node is always the base dependency, followed by one node per extra in
    /// listed order.
    pub fn from_requirement(
        &self,
        source: &Dependency,
        requirement: impl Into<RequirementInput>,
        url: Option<&str>,
        editable: bool,
    ) -> Result<Vec<F::Node>> {
        let requirement = requirement.into().into_parsed()?;
        let url = url
            .filter(|url| !url.trim().is_empty())
            .or(requirement.url.as_deref());
        let link = parse_link(url)?;
        let specifier = Specifier::parse(&requirement.specifier)?;
        let constraint = bind_constraint(source, specifier, link.as_ref());
        let marker = requirement
            .marker
            .as_deref()
            .map(Markers::parse)
            .transpose()?;
        let repo = self.locator.locate(link.as_ref())?;

        let base = Dependency {
            raw_name: requirement.name,
            constraint,
            repo,
            link,
            marker,
            editable,
            info: DependencyInfo::default(),
        };
        Ok(self.assemble(base, &requirement.extras))
    }

    /// Builds nodes from discrete parameters.
    ///
    /// Differs from [`Self::from_requirement`] in three ways: a generated
    /// seven-hex name is replaced by the name the link carries; the constraint
    /// is only bound to a requirer when `source` is set; an explicit `repo` is
    /// used as-is.
    pub fn from_params(&self, params: DependencyParams<'_>) -> Result<Vec<F::Node>> {
        let DependencyParams {
            mut raw_name,
            constraint,
            url,
            source,
            repo,
            marker,
            extras,
            editable,
            info,
        } = params;

        let link = parse_link(url.as_deref())?;
        if let Some(link_name) = link.as_ref().and_then(Link::name) {
            if is_likely_generated_name(&raw_name) {
                debug!(generated = %raw_name, recovered = link_name, "recovered name from link");
                raw_name = link_name.to_string();
            }
        }

        let constraint = match source {
            Some(source) => constraint.bind(source, link.as_ref())?,
            None => constraint.into_constraint()?,
        };
        let repo = match repo {
            Some(repo) => repo,
            None => self.locator.locate(link.as_ref())?,
        };
        let marker = marker.as_deref().map(Markers::parse).transpose()?;

        let base = Dependency {
            raw_name,
            constraint,
            repo,
            link,
            marker,
            editable,
            info,
        };
        Ok(self.assemble(base, &extras))
    }

    fn assemble(&self, base: Dependency, extras: &[String]) -> Vec<F::Node> {
        let base = Arc::new(base);
        let mut nodes = Vec::with_capacity(extras.len() + 1);
        nodes.push(self.factory.base(Arc::clone(&base)));
        nodes.extend(extras.iter().map(|extra| self.factory.extra(&base, extra)));
        nodes
    }
}

/// Binds `specifier` to `source`, replacing it with the Git pin when the link
/// pins a VCS revision.
fn bind_constraint(source: &Dependency, specifier: Specifier, link: Option<&Link>) -> Constraint {
    let source_name = source.name();
    let mut constraint = Constraint::new(&source_name, specifier);
    if let Some(revision) = link.and_then(Link::pinned_revision) {
        debug!(source = %source_name, revision, "vcs revision overrides version range");
        constraint.pin_git(&source_name);
    }
    constraint
}
