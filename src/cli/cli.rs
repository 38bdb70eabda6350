use clap::Parser;

use crate::cli::LogLevel;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Keeps a registry of named filesystem paths")]
pub struct Cli {
    /// Key to look up; prints the stored path if it still exists on disk
    #[clap(conflicts_with_all = ["add", "remove", "list"])]
    pub key: Option<String>,

    /// Add or overwrite an entry and persist the registry
    #[clap(long, num_args = 2, value_names = ["KEY", "PATH"])]
    pub add: Option<Vec<String>>,

    /// Remove an entry and persist the registry
    #[clap(long, value_name = "KEY", conflicts_with = "add")]
    pub remove: Option<String>,

    /// List every entry sorted by key (the default when no arguments are given)
    #[clap(long, conflicts_with_all = ["add", "remove"])]
    pub list: bool,

    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,
}
