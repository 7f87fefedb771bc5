use clap::{ArgAction, Args, Parser, Subcommand};

pub const DX_ABOUT: &str = "Turn Python requirements into canonical dependency records";

#[derive(Parser, Debug)]
#[command(author, version, about = DX_ABOUT, disable_help_subcommand = true)]
pub struct DxCli {
    #[arg(
        short,
        long,
        help = "Suppress human output (errors still print to stderr)",
        global = true
    )]
    pub quiet: bool,
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase logging (-vv reaches trace)",
        global = true
    )]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q", global = true)]
    pub trace: bool,
    #[arg(
        long,
        help = "Emit {status,message,details} JSON envelopes",
        global = true
    )]
    pub json: bool,
    #[command(subcommand)]
    pub command: CommandGroupCli,
}

#[derive(Subcommand, Debug)]
pub enum CommandGroupCli {
    #[command(about = "Build dependency records for one or more PEP 508 requirements")]
    Inspect(InspectArgs),
    #[command(about = "Evaluate an environment marker against a target interpreter")]
    Marker(MarkerArgs),
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[arg(value_name = "REQUIREMENT", required = true)]
    pub requirements: Vec<String>,
    #[arg(
        long,
        value_name = "NAME",
        default_value = "root",
        help = "Name of the project that requires these packages"
    )]
    pub source: String,
    #[arg(
        long,
        value_name = "URL",
        help = "Fetch every requirement from this URL instead of the one it names"
    )]
    pub url: Option<String>,
    #[arg(long, help = "Mark the dependencies as editable installs")]
    pub editable: bool,
}

#[derive(Args, Debug)]
pub struct MarkerArgs {
    #[arg(value_name = "MARKER")]
    pub marker: String,
    #[arg(
        long,
        value_name = "VERSION",
        help = "Target Python version (defaults to DX_PYTHON_VERSION or 3.12)"
    )]
    pub python: Option<String>,
    #[arg(
        long,
        value_name = "PLATFORM",
        help = "Target sys.platform (defaults to DX_PLATFORM or the host)"
    )]
    pub platform: Option<String>,
    #[arg(
        long = "extra",
        value_name = "EXTRA",
        help = "Treat this extra as active (repeatable)"
    )]
    pub extras: Vec<String>,
}
