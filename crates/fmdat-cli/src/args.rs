//! Command-line argument definitions for the fmdat CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Global arguments select the configuration file and the
//! logging verbosity; the [`Command`] picks what to do with network files.

use clap::{Parser, Subcommand};

/// Command-line arguments for the fmdat network tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a network and verify that it writes back unchanged
    Check {
        /// Path to the network file
        input: String,
    },

    /// List the units of a network in file order
    List {
        /// Path to the network file
        input: String,

        /// Only list one category (boundaries, sections, conduits, structures, losses)
        #[arg(long)]
        category: Option<String>,
    },

    /// Report the differences between two networks
    Diff {
        left: String,
        right: String,

        /// Print the differences as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export a network as a JSON interchange record
    Json {
        /// Path to the network file
        input: String,

        /// Path to the output JSON file, standard output if omitted
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Rename a unit and save the network
    Rename {
        /// Path to the network file
        input: String,

        /// Category of the unit (boundaries, sections, conduits, structures, losses)
        category: String,

        /// Current unit name
        from: String,

        /// New unit name
        to: String,

        /// Save to this path instead of overwriting the input
        #[arg(short, long)]
        output: Option<String>,
    },
}
