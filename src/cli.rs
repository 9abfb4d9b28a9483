use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "class-closure")]
#[command(
    about = "Check that every class reachable from an entry class is present in a set of jars"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to $CLASS_CLOSURE_CONFIG, then the user config directory)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Walk the dependency closure of ENTRY across the archives, in order
    Check {
        /// Fully-qualified entry class, e.g. com.example.Main
        entry: String,

        /// Jars or class directories; earlier archives shadow later ones
        #[arg(value_name = "ARCHIVE", required = true)]
        archives: Vec<PathBuf>,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Extra platform prefix to skip (repeatable)
        #[arg(long = "platform-prefix", value_name = "PREFIX")]
        platform_prefixes: Vec<String>,

        /// Treat every referenced class as required
        #[arg(long)]
        no_platform_filter: bool,
    },
    /// List the classes each archive defines
    Classes {
        #[arg(value_name = "ARCHIVE", required = true)]
        archives: Vec<PathBuf>,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
