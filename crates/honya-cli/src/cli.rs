use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "honya")]
#[command(about = "Search galleries, export shelves, resolve download links and download archives")]
#[command(version)]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use this config file instead of the user config.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search by keyword or tag and rank results against the query.
    Search(SearchArgs),

    /// List favorites shelves.
    Shelves,

    /// Export every comic on a shelf.
    Shelf {
        /// Shelf id; 0 is the "all" shelf.
        #[arg(long, default_value_t = 0)]
        id: u64,

        /// Also resolve download links and write the enriched export.
        #[arg(long)]
        links: bool,
    },

    /// Resolve download links for an export file or a single gallery id.
    Links {
        /// Path to an export JSON file, or a numeric gallery id.
        target: String,
    },

    /// Download archives for every comic with links in an export file.
    Download {
        file: PathBuf,
    },

    /// List saved export files.
    Files,

    /// Show the config file location and check it.
    Config {
        /// Report problems and exit non-zero if any.
        #[arg(long)]
        check: bool,

        /// Write the built-in defaults to the user config file.
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    pub query: String,

    /// Search by tag instead of keyword.
    #[arg(long)]
    pub tag: bool,

    /// Upper bound on result pages fetched.
    #[arg(long, value_name = "N")]
    pub max_pages: Option<u32>,

    /// Similarity floor in [0, 1].
    #[arg(long, value_name = "F")]
    pub min_similarity: Option<f64>,

    /// Show every confidence tier, not only the best one.
    #[arg(long)]
    pub all: bool,

    /// Save the matches to the search results directory.
    #[arg(long)]
    pub save: bool,

    /// With --save, write one file per series.
    #[arg(long, requires = "save")]
    pub grouped: bool,
}
