use std::fmt::Write as _;

use color_eyre::{eyre::WrapErr, Result};
use dx_core::domain::{DependencyNode, MarkerEnv};
use dx_core::{
    build_requirements, BatchOptions, BatchReport, Config, Dependency, DependencyMaker,
    ExecutionOutcome, Markers,
};
use serde_json::json;
use tracing::debug;

use crate::cli::{CommandGroupCli, InspectArgs, MarkerArgs};

pub fn dispatch_command(
    config: &Config,
    group: &CommandGroupCli,
) -> Result<(&'static str, ExecutionOutcome)> {
    match group {
        CommandGroupCli::Inspect(args) => Ok(("inspect", inspect(config, args))),
        CommandGroupCli::Marker(args) => marker(config, args).map(|outcome| ("marker", outcome)),
    }
}

fn inspect(config: &Config, args: &InspectArgs) -> ExecutionOutcome {
    let maker = DependencyMaker::with_locator(config.locator());
    let source = Dependency::root(args.source.as_str());
    let options = BatchOptions {
        url: args.url.as_deref(),
        editable: args.editable,
    };
    let report = build_requirements(&maker, &source, &args.requirements, options);
    debug!(
        built = report.built.len(),
        failed = report.failures.len(),
        "inspect finished"
    );

    let details = report.details();
    if report.is_clean() {
        ExecutionOutcome::success(render_report(&report), details)
    } else {
        let mut details = details;
        if let Some(first) = report.failures.first() {
            if let (Some(map), Some(hint)) = (details.as_object_mut(), first.error.hint()) {
                map.insert("hint".into(), json!(hint));
            }
        }
        ExecutionOutcome::user_error(render_report(&report), details)
    }
}

fn render_report(report: &BatchReport<DependencyNode>) -> String {
    let mut out = String::new();
    for built in &report.built {
        for node in &built.nodes {
            let dep = node.dependency();
            let _ = write!(out, "{node}");
            if node.extra().is_none() {
                let _ = write!(out, "  [{}: {}]", dep.repo.kind(), dep.repo);
                if dep.editable {
                    out.push_str(" (editable)");
                }
            }
            out.push('\n');
        }
    }
    for failure in &report.failures {
        let _ = writeln!(out, "error: {}", failure.error);
    }
    let _ = write!(
        out,
        "{} requirement(s) built into {} node(s), {} rejected",
        report.built.len(),
        report.node_count(),
        report.failures.len()
    );
    out
}

fn marker(config: &Config, args: &MarkerArgs) -> Result<ExecutionOutcome> {
    let markers = match Markers::parse(&args.marker) {
        Ok(markers) => markers,
        Err(err) => return Ok(ExecutionOutcome::from(err)),
    };
    let target = config
        .clone()
        .with_target(args.python.as_deref(), args.platform.as_deref());
    let env: MarkerEnv = target.marker_env();
    let environment = match env.to_marker_environment() {
        Ok(environment) => environment,
        Err(err) => return Ok(ExecutionOutcome::from(err)),
    };
    let extras = args.extras.iter().map(String::as_str).collect::<Vec<_>>();
    let applies = markers.evaluate_with_extras(&environment, &extras);

    let details = json!({
        "marker": markers.to_string(),
        "applies": applies,
        "extras": args.extras,
        "environment": serde_json::to_value(&env).wrap_err("failed to encode marker environment")?,
    });
    let message = format!(
        "{markers} is {applies} for Python {} on {}",
        env.python_version, env.sys_platform
    );
    Ok(ExecutionOutcome::success(message, details))
}
