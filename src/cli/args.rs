//! CLI argument definitions using clap
//!
//! Commands:
//! - docquery query --schema <path> [--config <path>]
//! - docquery aggregate --schema <path> [--config <path>]
//! - docquery cursor --schema <path> [--config <path>]
//! - docquery fields --schema <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docquery - compile filter, aggregate and cursor requests into native queries
#[derive(Parser, Debug)]
#[command(name = "docquery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log every compilation at TRACE
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile an offset-paged query read from stdin
    Query {
        /// Path to the collection schema
        #[arg(long)]
        schema: PathBuf,

        /// Path to compiler configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compile an aggregate query read from stdin
    Aggregate {
        /// Path to the collection schema
        #[arg(long)]
        schema: PathBuf,

        /// Path to compiler configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compile a cursor-paged query read from stdin
    Cursor {
        /// Path to the collection schema
        #[arg(long)]
        schema: PathBuf,

        /// Path to compiler configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the flattened field types of a schema
    Fields {
        /// Path to the collection schema
        #[arg(long)]
        schema: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_command() {
        let cli = Cli::parse_from([
            "docquery",
            "query",
            "--schema",
            "users.json",
            "--config",
            "docquery.json",
        ]);
        match cli.command {
            Command::Query { schema, config } => {
                assert_eq!(schema, PathBuf::from("users.json"));
                assert_eq!(config, Some(PathBuf::from("docquery.json")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(!cli.verbose);
    }

    #[test]
    fn test_parse_verbose_fields() {
        let cli = Cli::parse_from(["docquery", "fields", "--schema", "s.json", "--verbose"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Fields { .. }));
    }

    #[test]
    fn test_schema_required() {
        assert!(Cli::try_parse_from(["docquery", "cursor"]).is_err());
    }
}
