//! Audio fingerprint generation using Chromaprint/fpcalc
//!
//! This module shells out to the `fpcalc` command-line tool (part of Chromaprint)
//! to generate audio fingerprints. This approach is more reliable than Rust bindings
//! and works on all platforms where fpcalc is installed.
//!
//! Install fpcalc:
//! - Windows: `winget install AcoustID.Chromaprint` or download from https://acoustid.org/chromaprint
//! - macOS: `brew install chromaprint`
//! - Linux: `apt install libchromaprint-tools` or equivalent

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::enrichment::domain::{AudioFingerprint, EnrichmentError};

/// Common installation paths for fpcalc on Windows
#[cfg(windows)]
const FPCALC_PATHS: &[&str] = &[
    "fpcalc", // In PATH
    r"C:\Program Files\Chromaprint\fpcalc.exe",
    r"C:\Program Files\MusicBrainz Picard\fpcalc.exe",
    r"C:\Program Files (x86)\Chromaprint\fpcalc.exe",
];

#[cfg(not(windows))]
const FPCALC_PATHS: &[&str] = &[
    "fpcalc", // In PATH
    "/usr/bin/fpcalc",
    "/usr/local/bin/fpcalc",
    "/opt/homebrew/bin/fpcalc",
];

/// A located fpcalc executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fpcalc {
    program: PathBuf,
}

impl Fpcalc {
    /// Find fpcalc on the PATH or in a common install location.
    pub fn locate() -> Option<Self> {
        FPCALC_PATHS
            .iter()
            .map(PathBuf::from)
            .map(|program| Self { program })
            .find(|fpcalc| fpcalc.version().is_some())
    }

    /// Use a specific executable without probing it.
    pub fn at(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Version line reported by `fpcalc -version`.
    pub fn version(&self) -> Option<String> {
        Command::new(&self.program)
            .arg("-version")
            .output()
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
    }

    /// Fingerprint one file. Blocks until fpcalc exits.
    pub fn fingerprint(&self, path: &Path) -> Result<AudioFingerprint, EnrichmentError> {
        let output = Command::new(&self.program)
            .arg("-json")
            .arg(path)
            .output()
            .map_err(|e| EnrichmentError::FingerprintError(format!("Failed to run fpcalc: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EnrichmentError::FingerprintError(format!(
                "fpcalc failed for {}: {}",
                path.display(),
                stderr.trim()
            )));
        }

        parse_fpcalc_json(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse the JSON output from fpcalc
fn parse_fpcalc_json(json: &str) -> Result<AudioFingerprint, EnrichmentError> {
    let parsed: FpcalcOutput = serde_json::from_str(json)
        .map_err(|e| EnrichmentError::FingerprintError(format!("Failed to parse fpcalc output: {}", e)))?;

    if parsed.fingerprint.is_empty() {
        return Err(EnrichmentError::FingerprintError("fpcalc returned an empty fingerprint".to_string()));
    }

    Ok(AudioFingerprint {
        fingerprint: parsed.fingerprint,
        duration_secs: parsed.duration.round() as u32,
    })
}

/// fpcalc JSON output structure
#[derive(serde::Deserialize)]
struct FpcalcOutput {
    fingerprint: String,
    duration: f64,
}

/// Check if fpcalc is available on the system
pub fn is_fpcalc_available() -> bool {
    Fpcalc::locate().is_some()
}

/// Get fpcalc version string (for diagnostics)
pub fn fpcalc_version() -> Option<String> {
    Fpcalc::locate()?.version()
}
