//! Acoustic fingerprinting - identifies recordings from the audio itself.
//!
//! # Architecture
//!
//! This module follows a clean separation between:
//! - **Domain models** (`domain.rs`) - Internal types that represent our business logic
//! - **API DTOs** (`acoustid/dto.rs`) - Exact API response shapes
//! - **Adapters** - Convert DTOs to domain models
//! - **Clients** - HTTP clients for external APIs
//! - **Fingerprint** - Audio fingerprint generation via fpcalc
//! - **Fingerprinter** - The identification collaborator tying them together
//!
//! # Usage
//!
//! ```ignore
//! use music_matcher::enrichment::AcoustIdFingerprinter;
//!
//! let fingerprinter = AcoustIdFingerprinter::new("your-api-key")?;
//! fingerprinter.lookup(&mut tracks, 0.5).await?;
//! println!("{:?}", tracks[0].acoustid_results);
//! ```

pub mod acoustid;
pub mod domain;
pub mod fingerprint;
pub mod fingerprinter;

pub use domain::{AudioFingerprint, EnrichmentError, RecordingMatch};
pub use fingerprint::{Fpcalc, fpcalc_version, is_fpcalc_available};
pub use fingerprinter::AcoustIdFingerprinter;
