//! Slug classification for catalog identifiers
//!
//! Upstream slugs are opaque, but episode slugs embed their series slug
//! followed by an episode marker and number, e.g.
//! `one-piece-episode-1120-subtitle-indonesia`. Every function in this module
//! is derived from one ordered pattern table and is total over all strings.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use utoipa::ToSchema;

/// Whether a slug names an episode or a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SlugKind {
    Episode,
    Series,
}

/// One row of the pattern table
struct SlugPattern {
    /// Whether a hit on `number` marks the slug as an episode
    marks_episode: bool,
    /// Matches the episode suffix to strip when deriving the series slug
    suffix: Regex,
    /// Captures the episode number in group 1
    number: Regex,
}

impl SlugPattern {
    fn new(marks_episode: bool, suffix: &str, number: &str) -> Self {
        Self {
            marks_episode,
            suffix: Regex::new(suffix).expect("slug suffix pattern is a valid regex"),
            number: Regex::new(number).expect("slug number pattern is a valid regex"),
        }
    }
}

/// Priority order: full marker, abbreviated marker, bare trailing number.
static PATTERNS: LazyLock<[SlugPattern; 3]> = LazyLock::new(|| {
    [
        SlugPattern::new(true, r"(?i)-episode-\d+.*$", r"(?i)\bepisode-(\d+)"),
        SlugPattern::new(true, r"(?i)-ep-\d+.*$", r"(?i)\bep-(\d+)"),
        SlugPattern::new(false, r"-\d+.*$", r"-(\d+)-"),
    ]
});

/// Check if a slug identifies an episode
///
/// True iff an `episode-<digits>` or `ep-<digits>` token appears, in any case.
///
/// # Example
/// ```
/// use animekompi::slug::is_episode;
///
/// assert!(is_episode("one-piece-episode-1120-subtitle-indonesia"));
/// assert!(!is_episode("one-piece"));
/// ```
pub fn is_episode(slug: &str) -> bool {
    PATTERNS
        .iter()
        .filter(|p| p.marks_episode)
        .any(|p| p.number.is_match(slug))
}

/// Classify a slug as an episode or a series
pub fn classify(slug: &str) -> SlugKind {
    if is_episode(slug) {
        SlugKind::Episode
    } else {
        SlugKind::Series
    }
}

/// Derive the series slug from an episode slug
///
/// Strips the suffix of the first pattern that matches and nothing more.
/// Returns the input unchanged when no pattern matches, so it is safe to call
/// on a slug that may already name a series.
///
/// # Example
/// ```
/// use animekompi::slug::series_slug;
///
/// assert_eq!(series_slug("one-piece-episode-1120-subtitle-indonesia"), "one-piece");
/// assert_eq!(series_slug("one-piece"), "one-piece");
/// ```
pub fn series_slug(slug: &str) -> &str {
    PATTERNS
        .iter()
        .find_map(|p| p.suffix.find(slug))
        .map_or(slug, |m| &slug[..m.start()])
}

/// Extract the episode number embedded in a slug
///
/// The digit run is returned exactly as written (leading zeros included).
pub fn episode_number(slug: &str) -> Option<&str> {
    PATTERNS
        .iter()
        .find_map(|p| p.number.captures(slug))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
