use clap::{Args, CommandFactory, Parser};
use rightskit::ChangeOptions;
use std::path::PathBuf;

const BANNER: &str = concat!(
    "RIGHTS VERSION ",
    env!("CARGO_PKG_VERSION"),
    ". THIS PROGRAM COMES WITH NO WARRANTY WHATSOEVER. MAKE BACKUPS!"
);

#[derive(Parser, Debug)]
#[command(name = "rights")]
#[command(version)]
#[command(about = "Recursively enforce ownership and permission bits on a directory tree", long_about = None)]
#[command(before_help = BANNER)]
#[command(after_help = "At least one of owner, group or mode must be provided.")]
pub struct Cli {
    /// Root directory
    #[arg(required_unless_present = "rules", conflicts_with = "rules")]
    pub path: Option<PathBuf>,

    /// Read requests from FILE, one "<path> [options]" per line
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    #[command(flatten)]
    pub attrs: AttributeArgs,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Reject flag combinations clap cannot express on its own.
    pub fn validate(&self) -> Result<(), clap::Error> {
        if self.rules.is_some() && self.attrs.has_targets() {
            return Err(Self::command().error(
                clap::error::ErrorKind::ArgumentConflict,
                "--owner, --group, --mode, --mindepth and --maxdepth belong in the rules file, not next to --rules",
            ));
        }
        Ok(())
    }
}

/// Attribute flags shared by the command line and rules-file lines.
#[derive(Args, Debug, Clone, Default)]
pub struct AttributeArgs {
    /// Sets the file owner (name or uid)
    #[arg(short, long)]
    pub owner: Option<String>,

    /// Sets the file group (name or gid)
    #[arg(short, long)]
    pub group: Option<String>,

    /// Sets the directory mode; file mode is calculated by applying mask
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Sets the file mask [default: 0666]
    #[arg(long, env = "RIGHTS_MASK")]
    pub mask: Option<String>,

    /// Run dry, just report what would happen
    #[arg(short = 'n', long)]
    pub dry: bool,

    /// Minimum depth level, the root is 0 [default: 0]
    #[arg(long = "mindepth", value_name = "MIN")]
    pub min_depth: Option<usize>,

    /// Maximum depth level [default: unbounded]
    #[arg(long = "maxdepth", value_name = "MAX")]
    pub max_depth: Option<usize>,
}

impl AttributeArgs {
    fn has_targets(&self) -> bool {
        self.owner.is_some()
            || self.group.is_some()
            || self.mode.is_some()
            || self.min_depth.is_some()
            || self.max_depth.is_some()
    }

    pub fn into_options(self) -> ChangeOptions {
        ChangeOptions {
            owner: self.owner,
            group: self.group,
            mode: self.mode,
            mask: self.mask,
            min_depth: self.min_depth,
            max_depth: self.max_depth,
            dry_run: self.dry,
        }
    }
}

/// One line of a rules file: `<path> [options]`.
#[derive(Parser, Debug)]
#[command(name = "rule", no_binary_name = true)]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct RuleLine {
    /// Root directory, `~` expands to the home directory
    pub path: String,

    #[command(flatten)]
    pub attrs: AttributeArgs,
}
