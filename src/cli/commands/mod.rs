//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `identify`: Scan a path and match it against catalog releases
//! - `check_tools`: Report fpcalc and API key availability

mod check_tools;
mod identify;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tokio::runtime::Runtime;

use music_matcher::config::FingerprintingMode;

pub use check_tools::cmd_check_tools;
pub use identify::{IdentifyArgs, cmd_identify};

/// Music Matcher CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Identify the releases a file or folder of audio files belongs to
    Identify {
        /// Audio file or directory to scan
        path: PathBuf,
        /// Treat every scanned file as one release
        #[arg(long)]
        single_release: bool,
        /// Files are a new download (allows fingerprinting under `new-files`)
        #[arg(long)]
        new_download: bool,
        /// Don't pair candidates with files the library already holds
        #[arg(long)]
        no_existing: bool,
        /// When to use acoustic fingerprinting (default from config)
        #[arg(long, value_enum)]
        fingerprint: Option<FingerprintArg>,
        /// JSON catalog mirror (default from config)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// AcoustID API key (or set ACOUSTID_API_KEY env var)
        #[arg(short, long, env = "ACOUSTID_API_KEY")]
        api_key: Option<String>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check if fingerprinting tools are installed
    CheckTools,
}

/// `--fingerprint` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FingerprintArg {
    Never,
    NewFiles,
    AllFiles,
}

impl From<FingerprintArg> for FingerprintingMode {
    fn from(arg: FingerprintArg) -> Self {
        match arg {
            FingerprintArg::Never => Self::Never,
            FingerprintArg::NewFiles => Self::NewFiles,
            FingerprintArg::AllFiles => Self::AllFiles,
        }
    }
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Identify {
            path,
            single_release,
            new_download,
            no_existing,
            fingerprint,
            catalog,
            api_key,
            json,
        } => {
            let rt = Runtime::new()?;
            let args = IdentifyArgs {
                path: path.clone(),
                single_release: *single_release,
                new_download: *new_download,
                include_existing: !*no_existing,
                fingerprinting: fingerprint.map(FingerprintingMode::from),
                catalog: catalog.clone(),
                api_key: api_key.clone(),
                json: *json,
            };
            cmd_identify(&rt, &args)
        }
        Commands::CheckTools => cmd_check_tools(),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Print installation instructions for fpcalc
pub(crate) fn print_fpcalc_install_instructions() {
    eprintln!("Install Chromaprint:");
    eprintln!("  Windows: winget install AcoustID.Chromaprint");
    eprintln!("  macOS:   brew install chromaprint");
    eprintln!("  Linux:   apt install libchromaprint-tools");
}
