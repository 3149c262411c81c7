//! The `goop` command.
//!
//! ```text
//! goop --output <DIR> [--verbose] [SOURCE_DIR]
//! ```
//!
//! Reads the Go package in `SOURCE_DIR` (default: the current directory),
//! rewrites its overloaded operators and writes the result to `DIR`.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use bumpalo::Bump;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use goop::{CheckerConfig, GoopError, PrintConfig, Unit, read_sources, render_type_errors, write_outputs};

#[derive(Parser, Debug)]
#[command(name = "goop", version, about = "Operator overloading for Go")]
struct Options {
    /// Directory the transformed files are written to
    #[arg(short, long)]
    output: PathBuf,

    /// Print each written file and enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Package directory to transform
    #[arg(default_value = ".")]
    source_dir: PathBuf,
}

fn main() -> ExitCode {
    let options = Options::parse();
    init_logging(options.verbose);

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("goop: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(options: &Options) -> anyhow::Result<()> {
    let sources = read_sources(&options.source_dir)
        .with_context(|| format!("reading package {}", options.source_dir.display()))?;

    let arena = Bump::new();
    let mut unit = Unit::new(&arena);
    unit.parse_sources(&sources)?;

    let outputs = match unit.transform(&CheckerConfig::default(), &PrintConfig::default()) {
        Ok(outputs) => outputs,
        Err(GoopError::Type(errors)) => {
            eprint!("{}", render_type_errors(errors.iter(), &sources));
            anyhow::bail!("{} type error(s) in {}", errors.len(), options.source_dir.display());
        }
        Err(err) => return Err(err.into()),
    };

    let written = write_outputs(&options.output, &outputs)
        .with_context(|| format!("writing to {}", options.output.display()))?;
    if options.verbose {
        for path in &written {
            println!("{}", path.display());
        }
    }
    Ok(())
}
