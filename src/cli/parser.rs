use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command line interface
#[derive(Debug, Parser)]
#[command(name = "bugscan")]
#[command(about = "Collect GitHub issues whose bug label was applied and later removed", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Project configuration file (defaults to .bugscan/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Personal access token used as bearer credential
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan closed issues for a bug label that was applied and later removed
    Scan(ScanArgs),

    /// Fetch metadata and timelines for issues listed in a scan log
    Fetch(FetchArgs),

    /// Print the issue numbers mentioned in a scan log
    Extract(ExtractArgs),
}

#[derive(Debug, Args)]
pub struct RepoArgs {
    /// Repository owner or organization
    #[arg(long, env = "GITHUB_OWNER")]
    pub owner: Option<String>,

    /// Repository name
    #[arg(long, env = "GITHUB_REPO")]
    pub repo: Option<String>,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Label whose history is inspected (defaults to type:bug)
    #[arg(long)]
    pub label: Option<String>,

    /// Output JSON file (defaults to data.json)
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Log file to read issue numbers from
    #[arg(short, long, env = "INPUT_FILE", default_value = "scan.log")]
    pub input: PathBuf,

    /// Output JSON file (defaults to issue_data.json)
    #[arg(short, long, env = "OUTPUT_FILE")]
    pub output: Option<String>,

    /// Pause between issues, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub delay_ms: u64,
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Log file to read issue numbers from
    #[arg(short, long, env = "INPUT_FILE", default_value = "scan.log")]
    pub input: PathBuf,
}

/// Parse command line arguments (including program name)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}
