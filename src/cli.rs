use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "formsync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Keep application forms in sync with a declared configuration", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the order applications would be processed in
    Plan(ProjectArgs),

    /// Check each application's schema file, dependencies first
    Validate(ProjectArgs),

    /// Compare two schema exports without contacting the service
    Diff(DiffArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct ProjectArgs {
    /// Project file (TOML, or JSON with a .json extension)
    #[arg(short, long, default_value = "formsync.toml", env = "FORMSYNC_CONFIG")]
    pub config: String,

    /// Only these applications (repeatable)
    #[arg(short, long = "app", value_name = "NAME")]
    pub apps: Vec<String>,
}

#[derive(Parser)]
pub struct DiffArgs {
    /// Declared schema export
    pub declared: PathBuf,

    /// Remote schema export
    pub remote: PathBuf,
}
