//! Command-line interface for photonotes.
//!
//! This module provides the CLI structure for the `photonote` binary. The
//! CLI keeps no state of its own: every invocation reloads notes from the
//! durable stores.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::note::Note;

pub use commands::{
    join_caption, AddCommand, CheckCommand, ConfigCommand, DeleteCommand, EditCommand,
    ListCommand, OutputFormat, ShowCommand, StatusCommand,
};

/// photonote - Photos with captions
///
/// Stores captured images together with a short caption, and lets you list,
/// edit and delete them.
#[derive(Debug, Parser)]
#[command(name = "photonote")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a captured image with a caption
    Add(AddCommand),

    /// List notes, newest first
    List(ListCommand),

    /// Show a single note
    Show(ShowCommand),

    /// Change the caption of a note
    Edit(EditCommand),

    /// Delete a note and its image
    Delete(DeleteCommand),

    /// Report orphaned images and notes with missing images
    Check(CheckCommand),

    /// Show storage locations and note count
    Status(StatusCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

/// Render a note's timestamp for humans.
#[must_use]
pub fn display_time(note: &Note) -> String {
    note.time().map_or_else(
        || format!("@{}ms", note.timestamp),
        |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}
