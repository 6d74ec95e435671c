//! Weighted multi-factor distance between local files and catalog data.
//!
//! A [`Distance`] collects penalties in `[0, 1]` under named [`Factor`]s.
//! Each factor carries a fixed weight; the normalized distance is
//!
//! ```text
//! Σ(penalty × weight) / Σ(count × weight)
//! ```
//!
//! which is 0 for identical inputs and 1 when every recorded comparison
//! disagrees completely.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// A named comparison contributing to a [`Distance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Factor {
    Artist,
    Album,
    AlbumId,
    Tracks,
    MissingTracks,
    UnmatchedTracks,
    TrackTitle,
    TrackArtist,
    TrackIndex,
    TrackLength,
    RecordingId,
    Source,
    MediaCount,
    MediaFormat,
    Year,
    Country,
    Label,
    CatalogNumber,
    AlbumDisambiguation,
}

impl Factor {
    pub const ALL: [Factor; 19] = [
        Factor::Artist,
        Factor::Album,
        Factor::AlbumId,
        Factor::Tracks,
        Factor::MissingTracks,
        Factor::UnmatchedTracks,
        Factor::TrackTitle,
        Factor::TrackArtist,
        Factor::TrackIndex,
        Factor::TrackLength,
        Factor::RecordingId,
        Factor::Source,
        Factor::MediaCount,
        Factor::MediaFormat,
        Factor::Year,
        Factor::Country,
        Factor::Label,
        Factor::CatalogNumber,
        Factor::AlbumDisambiguation,
    ];

    pub fn weight(self) -> f64 {
        match self {
            Factor::Artist => 3.0,
            Factor::Album => 3.0,
            Factor::AlbumId => 5.0,
            Factor::Tracks => 2.0,
            Factor::MissingTracks => 0.6,
            Factor::UnmatchedTracks => 0.9,
            Factor::TrackTitle => 3.0,
            Factor::TrackArtist => 2.0,
            Factor::TrackIndex => 1.0,
            Factor::TrackLength => 2.0,
            Factor::RecordingId => 10.0,
            Factor::Source => 2.0,
            Factor::MediaCount => 1.0,
            Factor::MediaFormat => 1.0,
            Factor::Year => 1.0,
            Factor::Country => 0.5,
            Factor::Label => 0.5,
            Factor::CatalogNumber => 0.5,
            Factor::AlbumDisambiguation => 0.5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Factor::Artist => "artist",
            Factor::Album => "album",
            Factor::AlbumId => "album_id",
            Factor::Tracks => "tracks",
            Factor::MissingTracks => "missing_tracks",
            Factor::UnmatchedTracks => "unmatched_tracks",
            Factor::TrackTitle => "track_title",
            Factor::TrackArtist => "track_artist",
            Factor::TrackIndex => "track_index",
            Factor::TrackLength => "track_length",
            Factor::RecordingId => "recording_id",
            Factor::Source => "source",
            Factor::MediaCount => "media_count",
            Factor::MediaFormat => "media_format",
            Factor::Year => "year",
            Factor::Country => "country",
            Factor::Label => "label",
            Factor::CatalogNumber => "catalog_number",
            Factor::AlbumDisambiguation => "album_disambiguation",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Penalty accumulator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distance {
    penalties: BTreeMap<Factor, Vec<f64>>,
}

static NON_ALPHANUMERIC: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"[^\p{L}\p{N}]").expect("valid regex"));

/// Lower-case, fold diacritics and drop everything but letters and digits.
pub fn clean_for_comparison(input: &str) -> String {
    let folded: String = input
        .to_lowercase()
        .nfkd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect();
    NON_ALPHANUMERIC.replace_all(&folded, "").into_owned()
}

/// Normalized Levenshtein similarity in `[0, 1]`; 1 means identical.
pub fn levenshtein_coefficient(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

impl Distance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn penalties(&self) -> &BTreeMap<Factor, Vec<f64>> {
        &self.penalties
    }

    /// Penalties recorded under `factor`, empty if none.
    pub fn penalties_for(&self, factor: Factor) -> &[f64] {
        self.penalties.get(&factor).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.penalties.is_empty()
    }

    /// Σ(count × weight): the raw distance if every penalty were 1.
    pub fn max_distance(&self) -> f64 {
        self.max_distance_excluding(&[])
    }

    /// Σ(penalty × weight)
    pub fn raw_distance(&self) -> f64 {
        self.raw_distance_excluding(&[])
    }

    pub fn normalized_distance(&self) -> f64 {
        self.normalized_distance_excluding(&[])
    }

    /// Normalized distance ignoring the given factors.
    pub fn normalized_distance_excluding(&self, excluded: &[Factor]) -> f64 {
        let max = self.max_distance_excluding(excluded);
        if max > 0.0 {
            self.raw_distance_excluding(excluded) / max
        } else {
            0.0
        }
    }

    fn max_distance_excluding(&self, excluded: &[Factor]) -> f64 {
        self.penalties
            .iter()
            .filter(|(factor, _)| !excluded.contains(factor))
            .map(|(factor, values)| values.len() as f64 * factor.weight())
            .sum()
    }

    fn raw_distance_excluding(&self, excluded: &[Factor]) -> f64 {
        self.penalties
            .iter()
            .filter(|(factor, _)| !excluded.contains(factor))
            .map(|(factor, values)| values.iter().sum::<f64>() * factor.weight())
            .sum()
    }

    pub fn add(&mut self, factor: Factor, value: f64) {
        self.penalties.entry(factor).or_default().push(value);
    }

    /// 0 if `value` is one of `options`, otherwise 1.
    pub fn add_equality<S: AsRef<str>>(&mut self, factor: Factor, value: &str, options: &[S]) {
        let found = options.iter().any(|o| o.as_ref() == value);
        self.add(factor, if found { 0.0 } else { 1.0 });
    }

    pub fn add_bool(&mut self, factor: Factor, expr: bool) {
        self.add(factor, if expr { 1.0 } else { 0.0 });
    }

    /// One full penalty per unit of difference; a single 0 when equal.
    pub fn add_number(&mut self, factor: Factor, value: i64, target: i64) {
        let diff = (value - target).unsigned_abs();
        if diff == 0 {
            self.add(factor, 0.0);
        } else {
            for _ in 0..diff {
                self.add(factor, 1.0);
            }
        }
    }

    /// `index / len` of `value` in the preference list, or 1 if absent.
    pub fn add_priority<S: AsRef<str>>(&mut self, factor: Factor, value: &str, options: &[S]) {
        let penalty = priority_of(value, options).unwrap_or(1.0);
        self.add(factor, penalty);
    }

    /// Like [`add_priority`](Self::add_priority) for several values: walks
    /// `options` in preference order and stops at the first one present in
    /// `values`.
    pub fn add_priority_list<S: AsRef<str>, T: AsRef<str>>(
        &mut self,
        factor: Factor,
        values: &[S],
        options: &[T],
    ) {
        let penalty = options
            .iter()
            .position(|o| values.iter().any(|v| v.as_ref() == o.as_ref()))
            .map_or(1.0, |index| index as f64 / options.len() as f64);
        self.add(factor, penalty);
    }

    /// `value` clamped to `[0, target]`, divided by `target`.
    pub fn add_ratio(&mut self, factor: Factor, value: f64, target: f64) {
        // avoid dividing by zero in case target == 0
        let number_ratio = if target > 0.0 {
            value.clamp(0.0, target) / target
        } else {
            0.0
        };
        self.add(factor, number_ratio);
    }

    /// `1 - similarity` of the cleaned strings; empty vs. non-empty is a
    /// full penalty and empty vs. empty none.
    pub fn add_string(&mut self, factor: Factor, a: &str, b: &str) {
        self.add(factor, string_score(a, b));
    }
}

fn priority_of<S: AsRef<str>>(value: &str, options: &[S]) -> Option<f64> {
    options
        .iter()
        .position(|o| o.as_ref() == value)
        .map(|index| index as f64 / options.len() as f64)
}

fn string_score(a: &str, b: &str) -> f64 {
    let a = clean_for_comparison(a);
    let b = clean_for_comparison(b);
    match (a.is_empty(), b.is_empty()) {
        (true, true) => 0.0,
        (true, false) | (false, true) => 1.0,
        (false, false) => 1.0 - levenshtein_coefficient(&a, &b),
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.normalized_distance())
    }
}
