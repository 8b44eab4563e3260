use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    // If there's a git tag at HEAD, use just the tag (release build)
    if let Some(tag) = option_env!("BINRC_GIT_TAG") {
        return tag;
    }

    // Not on a tag - include commit hash and branch (dev build)
    let commit = option_env!("BINRC_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("BINRC_GIT_BRANCH").unwrap_or("unknown");

    // Leaked once at startup
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

#[derive(Parser)]
#[command(name = "binrc")]
#[command(about = "Manage different versions of binaries on GitHub releases")]
#[command(version = get_version(), propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The path to binrc's cache directory, $HOME/.binrc by default
    #[arg(short = 'c', long, global = true)]
    pub cache_path: Option<String>,

    /// Naming templates file (YAML, or JSON with a .json extension)
    #[arg(short = 't', long, global = true)]
    pub templates: Option<PathBuf>,

    /// Base URL releases are downloaded from
    #[arg(long, global = true)]
    pub release_host: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install a project's binary and print its path
    #[command(after_help = "Examples:\n  binrc install spf13/hugo 0.68.3\n  binrc install hugo v0.68.3\n  HUGO_VERSION=0.68.3 binrc install hugo")]
    Install {
        /// Project as 'owner/name' or a known alias (e.g. 'hugo')
        project: String,
        /// Version to install; defaults to ${NAME}_VERSION
        #[arg(value_name = "VERSION")]
        release: Option<String>,
    },

    /// List all cached binaries
    List,

    /// Show the current version
    Version,
}
