//! qcirc Command-Line Interface
//!
//! Inspect, validate and reformat `OpenQASM` 2.0 files.
//!
//! ```text
//! qcirc check bell.qasm
//! qcirc fmt -I lib/ --decompose-wrappers bell.qasm -o flat.qasm
//! qcirc tokens bell.qasm
//! qcirc ast bell.qasm
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ast, check, fmt, tokens, version};

/// qcirc - OpenQASM 2.0 tooling
#[derive(Parser)]
#[command(name = "qcirc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Additional include search directory (repeatable)
    #[arg(short = 'I', long = "include", value_name = "DIR", global = true)]
    include: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a file and report its size
    Check {
        /// Input file
        input: PathBuf,
    },

    /// Load a file and print it back in canonical form
    Fmt {
        /// Input file
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Decompose every operation by one level before printing
        #[arg(long)]
        decompose_wrappers: bool,

        /// Reject invalid gate names instead of rewriting them
        #[arg(long)]
        keep_names: bool,
    },

    /// Print the token stream with positions
    Tokens {
        /// Input file
        input: PathBuf,

        /// Include whitespace and comments
        #[arg(short, long)]
        all: bool,
    },

    /// Print the parsed syntax tree as JSON
    Ast {
        /// Input file
        input: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG overrides -v
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Check { input } => check::execute(&input, &cli.include),

        Commands::Fmt {
            input,
            output,
            decompose_wrappers,
            keep_names,
        } => fmt::execute(
            &input,
            output.as_deref(),
            &cli.include,
            decompose_wrappers,
            keep_names,
        ),

        Commands::Tokens { input, all } => tokens::execute(&input, all),

        Commands::Ast { input } => ast::execute(&input, &cli.include),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
