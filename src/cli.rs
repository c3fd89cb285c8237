//! Command-line surface of dashq

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use crate::category::Category;

/// Search, filter and group a smart-home entity catalog
#[derive(Debug, Parser)]
#[command(
    name = "dashq",
    author,
    version,
    about = "Search, filter and group a smart-home entity catalog",
    propagate_version = true,
    after_help = "Use 'dashq <command> --help' for more information about a command."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,
    #[command(subcommand)]
    pub command: Command,
}

/// Flags accepted by every subcommand
#[derive(Debug, Clone, Args)]
pub struct GlobalOpts {
    /// How results are printed
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        global = true,
        conflicts_with = "json"
    )]
    pub output_format: Option<OutputFormat>,

    /// Same as `-o json`
    #[arg(long, global = true)]
    pub json: bool,

    /// Entity catalog file (JSON or YAML); defaults to the built-in demo catalog
    #[arg(short = 'c', long, value_name = "PATH", env = "DASHQ_CATALOG", global = true)]
    pub catalog: Option<PathBuf>,

    /// Override the fuzzy match threshold (0.0 exact .. 1.0 anything)
    #[arg(long, value_name = "0..1", global = true)]
    pub threshold: Option<f64>,

    /// Config file to use instead of the XDG location
    #[arg(long, value_name = "PATH", env = "DASHQ_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Silence all logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// More log output; repeat for more (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log at debug level
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log at trace level, including per-search hit counts
    #[arg(long, global = true)]
    pub trace: bool,

    /// Never colour log output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Print tables without a header row
    #[arg(long, global = true)]
    pub no_headers: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[non_exhaustive]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
    Auto,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fuzzy search the catalog, grouped into devices, sensors and actions
    Search {
        /// Search term (empty lists everything)
        #[arg(default_value = "")]
        term: String,

        /// Show at most this many results per group
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Run the search on a background thread
        #[arg(long)]
        background: bool,
    },

    /// Evaluate an operator query (!exclude =exact 'include fuzzy~)
    Query {
        /// Query expression
        #[arg(num_args = 0.., trailing_var_arg = true, allow_hyphen_values = true)]
        expr: Vec<String>,

        /// Print the parsed clauses instead of the results
        #[arg(long)]
        explain: bool,
    },

    /// Autocomplete suggestions with highlighted names
    Suggest {
        /// Partial term
        term: String,

        /// Maximum number of suggestions
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// List entities by category and subcategory
    List {
        /// Primary category
        #[arg(long, value_enum, default_value_t = Category::Devices)]
        category: Category,

        /// Subcategory chip (e.g. lights, covers, or an area name with --by-area)
        #[arg(long = "sub", default_value = "all")]
        subcategory: String,

        /// Bucket by area instead of domain
        #[arg(long)]
        by_area: bool,
    },

    /// Show subcategory chips with total and active counts
    Counts {
        /// Primary category
        #[arg(long, value_enum, default_value_t = Category::Devices)]
        category: Category,

        /// Bucket by area instead of domain
        #[arg(long)]
        by_area: bool,
    },

    /// Show one entity in detail
    Show {
        /// Entity ID (e.g., light.kitchen_ceiling)
        entity_id: String,
    },

    /// Interactive panel: type to search, :help for commands
    Panel,

    /// Inspect or reset the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the merged configuration
    Show,

    /// Print where the config file lives
    Path,

    /// Print one value, e.g. `search.threshold`
    Get {
        /// Dotted key; omit to print everything
        key: Option<String>,
    },

    /// Overwrite the config file with the defaults
    Reset,
}
