#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

mod build;
mod config;
mod outcome;

pub use build::{build_requirements, BatchOptions, BatchReport, BuildFailure, BuiltRequirement};
pub use config::{Config, IndexConfig, TargetConfig, DEFAULT_PYTHON_VERSION};
pub use outcome::{CommandStatus, ExecutionOutcome};

pub use dx_domain as domain;
pub use dx_domain::{Dependency, DependencyError, DependencyMaker, DependencyNode, Markers};
