//! Command-line interface for music-matcher.
//!
//! This module provides CLI commands for identifying which releases a
//! folder of audio files belongs to, and for checking the external tools
//! fingerprinting relies on.

mod commands;

pub use commands::{Cli, Commands, run_command};
