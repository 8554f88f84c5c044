use clap::{Args, Subcommand};
use std::path::PathBuf;

use envrec_frame::MAX_BODY_SIZE;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod dump;
pub mod types;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a recording and print its envelopes.
    Dump(DumpArgs),
    /// List the payload types that are decoded.
    Types(TypesArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Dump(args) => dump::run(args, format),
        Command::Types(args) => types::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Recording to read, or `-` for stdin.
    pub path: PathBuf,
    /// Only print envelopes with these dataTypes (comma-separated).
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub types: Option<Vec<i32>>,
    /// Exit after printing N envelopes.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub count: Option<u64>,
    /// Exit with status 60 if any frame, envelope or payload failed to decode.
    #[arg(long)]
    pub strict: bool,
    /// Treat frames announcing a larger body as corrupt.
    #[arg(long, value_name = "BYTES", default_value_t = MAX_BODY_SIZE)]
    pub max_body_size: usize,
}

#[derive(Args, Debug, Default)]
pub struct TypesArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
