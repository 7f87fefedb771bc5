#![deny(clippy::all)]

use clap::Parser;
use color_eyre::Result;
use dx_core::{CommandStatus, Config, ExecutionOutcome};
use serde_json::{json, Value};

mod cli;
mod dispatch;

use cli::{CommandGroupCli, DxCli};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = DxCli::parse();
    init_tracing(cli.trace, cli.verbose);

    let config = Config::from_env();
    tracing::debug!(
        index = %config.index().url,
        python = %config.target().python_version,
        platform = %config.target().platform,
        "loaded configuration"
    );

    let (command, outcome) = match dispatch::dispatch_command(&config, &cli.command) {
        Ok(result) => result,
        Err(err) => (
            command_name(&cli),
            ExecutionOutcome::failure(format!("{err:#}"), Value::Null),
        ),
    };
    let code = emit_output(&cli, command, &outcome)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("dx={level},dx_cli={level},dx_core={level},dx_domain={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn command_name(cli: &DxCli) -> &'static str {
    match cli.command {
        CommandGroupCli::Inspect(_) => "inspect",
        CommandGroupCli::Marker(_) => "marker",
    }
}

fn emit_output(cli: &DxCli, command: &str, outcome: &ExecutionOutcome) -> Result<i32> {
    let code = outcome.exit_code();

    if cli.json {
        let payload = json!({
            "command": command,
            "status": status_label(outcome.status),
            "code": code,
            "message": outcome.message,
            "details": outcome.details,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if outcome.status == CommandStatus::Ok {
        if !cli.quiet {
            println!("{}", outcome.message);
        }
    } else {
        eprintln!("dx {command}: {}", outcome.message);
        if let Some(hint) = hint_from_details(&outcome.details) {
            eprintln!("Hint: {hint}");
        }
    }

    Ok(code)
}

fn status_label(status: CommandStatus) -> &'static str {
    match status {
        CommandStatus::Ok => "ok",
        CommandStatus::UserError => "user-error",
        CommandStatus::Failure => "failure",
    }
}

fn hint_from_details(details: &Value) -> Option<&str> {
    details
        .as_object()
        .and_then(|map| map.get("hint"))
        .and_then(Value::as_str)
}
