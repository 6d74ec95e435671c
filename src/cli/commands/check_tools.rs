//! External tool checks.

use music_matcher::config;
use music_matcher::enrichment::Fpcalc;

use super::print_fpcalc_install_instructions;

/// Check if fingerprinting tools are installed
pub fn cmd_check_tools() -> anyhow::Result<()> {
    println!("Checking fingerprinting tools...\n");

    match Fpcalc::locate() {
        Some(fpcalc) => {
            let version = fpcalc.version().unwrap_or_default();
            println!("✓ fpcalc: {} ({})", version, fpcalc.program().display());
        }
        None => {
            println!("✗ fpcalc: NOT FOUND");
            print_fpcalc_install_instructions();
        }
    }

    println!();
    println!("API Keys:");
    let from_config = config::load().credentials.acoustid_api_key.is_some();
    if std::env::var("ACOUSTID_API_KEY").is_ok() {
        println!("✓ ACOUSTID_API_KEY: set");
    } else if from_config {
        println!("✓ AcoustID key: set in config");
    } else {
        println!("✗ ACOUSTID_API_KEY: not set");
        println!("  Get one at: https://acoustid.org/new-application");
    }

    Ok(())
}
