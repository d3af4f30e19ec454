//! CLI module for docquery
//!
//! Provides command-line interface for:
//! - query: compile an offset-paged query
//! - aggregate: compile an aggregate query
//! - cursor: compile a cursor-paged query
//! - fields: print a schema's flattened field types

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{compile, compile_request, fields, load_assembler, render, run_command, RequestKind};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_request, read_request, write_error, write_response};

use crate::observability::{Logger, Severity};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    if cli.verbose {
        Logger::set_min_severity(Severity::Trace);
    }
    run_command(cli.command)
}
