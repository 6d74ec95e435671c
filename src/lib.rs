//! Music Matcher - identifies which catalog releases audio files belong to.
//!
//! Scanned files are grouped into per-release batches, matched against a
//! local catalog mirror (falling back to MusicBrainz and AcoustID), and each
//! batch is assigned the release whose weighted distance is lowest.

pub mod augment;
pub mod catalog;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod identification;
pub mod metadata;
pub mod model;
pub mod scanner;
#[cfg(test)]
pub mod test_utils;
