#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # checkgrade
//!
//! Grades C++ assignments described by a grading configuration.
//!
//! ```text
//! checkgrade [--verbose] [--comment-marker STR] CONFIG
//! ```
//!
//! Reports go wherever the configuration's `:Output` commands send them;
//! diagnostics go to standard error. Set `CHECKGRADE_LOG` (eg. `debug`) to
//! change how chatty the diagnostics are.

use std::{env, path::PathBuf, str::FromStr};

use anyhow::Result;
use bpaf::*;
use checkgrade::constants::{DEFAULT_COMMENT_MARKER, LOG_LEVEL_ENV};
use dotenvy::dotenv;
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Command line options.
#[derive(Debug, Clone)]
struct Options {
    /// Log commands and parsed checks too.
    verbose:        bool,
    /// Instructor comment marker.
    comment_marker: String,
    /// Grading configuration.
    config:         PathBuf,
}

/// Parse the command line arguments and return the options
fn options() -> Options {
    let verbose = short('v')
        .long("verbose")
        .help("Log every command and parsed check")
        .switch();
    let comment_marker = long("comment-marker")
        .help("Instructor comment marker in the configuration")
        .argument::<String>("STR")
        .fallback(DEFAULT_COMMENT_MARKER.to_string())
        .display_fallback();
    let config = positional::<PathBuf>("CONFIG").help("Grading configuration");

    construct!(Options {
        verbose,
        comment_marker,
        config
    })
    .to_options()
    .descr("Autograder for C++ assignments")
    .run()
}

/// Log level from the environment, else from `--verbose`.
fn log_level(verbose: bool) -> LevelFilter {
    let default = if verbose { Level::DEBUG } else { Level::INFO };
    env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|level| Level::from_str(level.trim()).ok())
        .map_or(LevelFilter::from_level(default), LevelFilter::from_level)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let options = options();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);
    let filter_layer = log_level(options.verbose);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    checkgrade::grade(&options.config, &options.comment_marker).await?;
    Ok(())
}
