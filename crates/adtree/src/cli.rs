use clap::{Args, Parser, Subcommand, ValueEnum};
use membership_tree::tree::{Direction, TraversalOptions, DEFAULT_DEPTH};
use std::path::PathBuf;

/// Render group membership of a directory snapshot as a tree
#[derive(Debug, Parser)]
#[command(name = "adtree")]
#[command(version)]
#[command(about = "Render group membership of a directory snapshot as a tree")]
pub struct Cli {
    /// JSON snapshot of the directory
    #[arg(long, short = 'd', value_name = "FILE")]
    pub directory: PathBuf,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text", value_enum)]
    pub format: OutputFormat,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One indented line per node
    Text,
    /// An array of node records
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the members of one or more groups, recursively
    Members(TreeArgs),
    /// Show the groups one or more principals belong to, recursively
    MemberOf(TreeArgs),
}

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Distinguished names or account names
    #[arg(required = true, value_name = "IDENTITY")]
    pub identities: Vec<String>,

    /// Maximum depth displayed below each root
    #[arg(long, default_value_t = DEFAULT_DEPTH, conflicts_with = "recursive")]
    pub depth: usize,

    /// Walk the whole graph regardless of depth
    #[arg(long)]
    pub recursive: bool,

    /// Expand every occurrence of a group instead of marking repeats
    #[arg(long)]
    pub show_all: bool,

    /// Skip entries whose account name matches a wildcard pattern
    #[arg(long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Only display groups
    #[arg(long)]
    pub groups_only: bool,
}

impl Cli {
    pub fn direction(&self) -> Direction {
        match self.command {
            Command::Members(_) => Direction::Members,
            Command::MemberOf(_) => Direction::MemberOf,
        }
    }

    pub fn tree_args(&self) -> &TreeArgs {
        match &self.command {
            Command::Members(args) | Command::MemberOf(args) => args,
        }
    }

    pub fn traversal_options(&self) -> TraversalOptions {
        let args = self.tree_args();
        TraversalOptions {
            direction: self.direction(),
            depth: args.depth,
            recursive: args.recursive,
            show_all: args.show_all,
            groups_only: args.groups_only,
            exclude: args.exclude.clone(),
        }
    }
}
