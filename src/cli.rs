use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "codegrapher")]
#[command(about = "Token-budgeted code context along static import graphs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
    ///
    /// -v: info, -vv: debug, -vvv: trace. RUST_LOG takes precedence.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract a target file and the code it imports as JSON
    Extract {
        /// Python file to extract
        target: PathBuf,

        /// Project root (defaults to the target's directory)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Extract a single class or function instead of the whole file
        #[arg(short, long)]
        object: Option<String>,

        /// Token budget (overrides .codegrapher.toml and TOKEN_LIMIT)
        #[arg(short = 't', long = "token-limit", value_parser = positive_limit())]
        token_limit: Option<usize>,

        /// Emit the LLM-ready bundle with README and related files
        #[arg(long)]
        bundle: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Serve the get_python_code tool as JSON-RPC over stdio
    Serve {
        /// Token budget (overrides .codegrapher.toml and TOKEN_LIMIT)
        #[arg(short = 't', long = "token-limit", value_parser = positive_limit())]
        token_limit: Option<usize>,
    },

    /// List the project source files below a root
    Files {
        /// Project root
        root: PathBuf,
    },
}

fn positive_limit() -> clap::builder::RangedU64ValueParser<usize> {
    clap::builder::RangedU64ValueParser::new().range(1..)
}
