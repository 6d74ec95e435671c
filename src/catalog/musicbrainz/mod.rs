//! MusicBrainz API integration
//!
//! Remote catalog for releases the local mirror doesn't know yet. Every
//! release comes back with its track list.
//!
//! API docs: https://musicbrainz.org/doc/MusicBrainz_API

pub mod dto;
mod adapter;
mod client;

pub use adapter::to_album_release;
pub use client::{DEFAULT_BASE_URL, MusicBrainzClient};
