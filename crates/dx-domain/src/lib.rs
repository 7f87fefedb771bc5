#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod constraint;
pub mod dependency;
pub mod errors;
pub mod links;
pub mod maker;
pub mod markers;
pub mod names;
pub mod repository;
pub mod requirement;

pub use constraint::{narrow, Constraint, Specifier};
pub use dependency::{Dependency, DependencyInfo, DependencyNode, ExtraDependency, NodeSummary};
pub use errors::{DependencyError, Result};
pub use links::{parse_link, DirectLink, Link, LocalLink, VcsKind, VcsLink};
pub use maker::{ConstraintValue, DefaultNodes, DependencyMaker, DependencyParams, NodeFactory};
pub use markers::{MarkerEnv, Markers};
pub use names::{canonicalize_package_name, is_likely_generated_name};
pub use repository::{Repository, RepositoryLocator, DEFAULT_INDEX_NAME, DEFAULT_INDEX_URL};
pub use requirement::{ParsedRequirement, RequirementInput};
