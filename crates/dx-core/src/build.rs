//! Building many requirements for one requirer at once.

use dx_domain::{Dependency, DependencyError, DependencyMaker, DependencyNode, NodeFactory};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Settings applied to every requirement of a batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions<'a> {
    /// Overrides any URL written in the requirements.
    pub url: Option<&'a str>,
    pub editable: bool,
}

#[derive(Debug, Clone)]
pub struct BuiltRequirement<N> {
    pub requirement: String,
    pub nodes: Vec<N>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildFailure {
    /// The requirement exactly as it was given.
    pub requirement: String,
    #[serde(skip)]
    pub error: DependencyError,
}

impl BuildFailure {
    #[must_use]
    pub fn details(&self) -> Value {
        let mut details = self.error.details();
        if let Value::Object(map) = &mut details {
            map.insert("requirement".into(), json!(self.requirement));
            map.insert("message".into(), json!(self.error.to_string()));
        }
        details
    }
}

/// Results in input order; one bad item never hides the others.
#[derive(Debug, Clone)]
pub struct BatchReport<N> {
    pub built: Vec<BuiltRequirement<N>>,
    pub failures: Vec<BuildFailure>,
}

impl<N> BatchReport<N> {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of nodes across every built requirement.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.built.iter().map(|built| built.nodes.len()).sum()
    }
}

impl BatchReport<DependencyNode> {
    #[must_use]
    pub fn details(&self) -> Value {
        let built = self
            .built
            .iter()
            .map(|built| {
                json!({
                    "requirement": built.requirement,
                    "nodes": built.nodes.iter().map(DependencyNode::summary).collect::<Vec<_>>(),
                })
            })
            .collect::<Vec<_>>();
        let failures = self
            .failures
            .iter()
            .map(BuildFailure::details)
            .collect::<Vec<_>>();
        json!({ "built": built, "failures": failures })
    }
}

/// Builds each requirement against `source` on the rayon pool.
pub fn build_requirements<F>(
    maker: &DependencyMaker<F>,
    source: &Dependency,
    requirements: &[String],
    options: BatchOptions<'_>,
) -> BatchReport<F::Node>
where
    F: NodeFactory + Sync,
    F::Node: Send,
{
    let results = requirements
        .par_iter()
        .map(|requirement| {
            let result =
                maker.from_requirement(source, requirement.as_str(), options.url, options.editable);
            (requirement, result)
        })
        .collect::<Vec<_>>();

    let mut report = BatchReport {
        built: Vec::with_capacity(results.len()),
        failures: Vec::new(),
    };
    for (requirement, result) in results {
        match result {
            Ok(nodes) => {
                debug!(requirement = %requirement, nodes = nodes.len(), "built requirement");
                report.built.push(BuiltRequirement {
                    requirement: requirement.clone(),
                    nodes,
                });
            }
            Err(error) => {
                warn!(requirement = %requirement, code = error.code(), %error, "requirement rejected");
                report.failures.push(BuildFailure {
                    requirement: requirement.clone(),
                    error,
                });
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirements(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn failures_do_not_abort_the_batch() {
        let maker = DependencyMaker::new();
        let source = Dependency::root("app");
        let report = build_requirements(
            &maker,
            &source,
            &requirements(&["requests[socks]>=2", "bad[", "flask", "x; os_name =="]),
            BatchOptions::default(),
        );
        assert_eq!(
            report
                .built
                .iter()
                .map(|built| built.requirement.as_str())
                .collect::<Vec<_>>(),
            vec!["requests[socks]>=2", "flask"]
        );
        assert_eq!(report.node_count(), 3);
        assert!(!report.is_clean());
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].requirement, "bad[");
        assert_eq!(report.failures[0].error.code(), "DX101");
        assert_eq!(report.failures[1].requirement, "x; os_name ==");
    }

    #[test]
    fn batch_options_apply_to_every_item() {
        let maker = DependencyMaker::new();
        let source = Dependency::root("app");
        let report = build_requirements(
            &maker,
            &source,
            &requirements(&["tool>=1,<2"]),
            BatchOptions {
                url: Some("git+https://github.com/org/tool.git@v1.4"),
                editable: true,
            },
        );
        assert!(report.is_clean());
        let dep = report.built[0].nodes[0].dependency();
        assert!(dep.editable);
        assert!(dep.constraint.is_git_pinned());
    }

    #[test]
    fn details_list_nodes_and_failures() {
        let maker = DependencyMaker::new();
        let source = Dependency::root("app");
        let report = build_requirements(
            &maker,
            &source,
            &requirements(&["demo[cli]", "pkg @ ftp://example.com/pkg.zip"]),
            BatchOptions::default(),
        );
        let details = report.details();
        assert_eq!(details["built"][0]["nodes"][1]["extra"], "cli");
        assert_eq!(details["failures"][0]["code"], "DX102");
        assert_eq!(
            details["failures"][0]["requirement"],
            "pkg @ ftp://example.com/pkg.zip"
        );
    }
}
