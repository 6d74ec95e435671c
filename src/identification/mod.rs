//! Release identification
//!
//! Decides which catalog release a set of scanned audio files belongs to,
//! and which catalog track each file is.
//!
//! # Architecture
//!
//! - **Distance** (`distance.rs`) - weighted per-factor penalties
//! - **Munkres** (`munkres.rs`) - optimal track assignment
//! - **Calculator** (`calculator.rs`) - track and release distances
//! - **Grouping** (`grouping.rs`) - splits a scan into per-release batches
//! - **Candidates** (`candidates.rs`) - finds releases worth scoring
//! - **Service** (`service.rs`) - orchestration and fingerprint escalation
//! - **Traits** (`traits.rs`) - the collaborators the service depends on
//!
//! # Usage
//!
//! ```ignore
//! let service = IdentificationService::new(reader, augmenter, fingerprinter, catalog, remote, mode);
//! let releases = service.identify(tracks, &IdentificationOverrides::default(), &IdentifyOptions::default()).await?;
//! for release in releases.iter().filter(|r| r.is_matched()) {
//!     println!("{} ({:.3})", release.album_release.as_ref().unwrap(), release.distance.normalized_distance());
//! }
//! ```

pub mod calculator;
pub mod candidates;
pub mod distance;
pub mod grouping;
pub mod local;
pub mod munkres;
pub mod service;
pub mod test_case;
pub mod traits;

pub use distance::{Distance, Factor};
pub use local::{
    CandidateAlbumRelease, IdentificationOverrides, IdentifyOptions, LocalAlbumRelease, LocalTrack, TrackMapping,
    TrackMatch,
};
pub use service::IdentificationService;
pub use test_case::IdTestCase;
pub use traits::{Augmenter, CatalogMirror, Fingerprinter, RemoteCatalog, TagReader};
