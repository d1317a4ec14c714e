use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pathstate",
    about = "Inspect and edit a persisted pathstate tree",
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Session directory holding the store entries
    #[arg(long, global = true, default_value = ".pathstate")]
    pub dir: PathBuf,

    /// Prefix of the state and version entries
    #[arg(long, global = true, default_value = "pathstate")]
    pub namespace: String,

    /// Schema version tag; a stored tree with another tag is discarded
    #[arg(long = "version", global = true, value_name = "TAG")]
    pub schema_version: Option<String>,

    /// Check operation arguments before applying them
    #[arg(long, global = true)]
    pub validate: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the whole tree
    Show,
    /// Print the value at a path
    Get(PathArgs),
    /// Store a value at a path
    Set(SetArgs),
    /// Remove the value at a path
    Delete(PathArgs),
    /// Add to the number at a path
    Increment(StepArgs),
    /// Subtract from the number at a path
    Decrement(StepArgs),
    /// Negate the boolean at a path
    Toggle(PathArgs),
    /// Append values to the array at a path
    Push(PushArgs),
    /// Print the stored schema version
    Version,
    /// Remove the stored tree and version
    Clear,
}

#[derive(Args)]
pub struct PathArgs {
    pub path: String,
}

#[derive(Args)]
pub struct SetArgs {
    pub path: String,
    /// JSON value; text that is not JSON is stored as a string
    pub value: String,
}

#[derive(Args)]
pub struct StepArgs {
    pub path: String,
    #[arg(long, default_value = "1")]
    pub by: String,
}

#[derive(Args)]
pub struct PushArgs {
    pub path: String,
    /// JSON values; text that is not JSON is stored as a string
    #[arg(required = true)]
    pub values: Vec<String>,
}
