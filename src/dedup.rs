//! Duplicate detection by normalized title.
//!
//! Catalog track names carry a lot of release noise: remasters, live takes,
//! radio edits, features. Two tracks are considered the same song when they
//! share an artist and their titles are equal after [`uniform_title`] and
//! lowercasing.

use crate::model::{TrackRef, Uri};
use lazy_static::lazy_static;
use log::trace;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Keywords marking a title segment as release noise.
const NOISE_KEYWORDS: [&str; 14] = [
    "remaster",
    "deluxe",
    "demo",
    "mix",
    "version",
    "edit",
    "live",
    "session",
    "extended",
    "feat",
    "studio",
    "instrumental",
    "mono",
    "take",
];

lazy_static! {
    static ref PARENTHESIZED: Regex = Regex::new(r"\(.*?\)|\[.*?\]").unwrap();
}

fn has_noise(text: &str) -> bool {
    let lower = text.to_lowercase();
    NOISE_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// Best effort at recovering the actual song title from a catalog track name.
///
/// Parenthesized and bracketed segments containing a noise keyword are
/// removed, as are ` - ` separated suffixes containing one. The first ` - `
/// segment is always kept, so a title never normalizes to nothing. Matching
/// works on English keywords only.
///
/// ```
/// use deepcut::dedup::uniform_title;
///
/// assert_eq!(uniform_title("Song (2011 Remaster)"), "Song");
/// assert_eq!(uniform_title("Song - Live at Wembley"), "Song");
/// assert_eq!(uniform_title("Song (Reprise)"), "Song (Reprise)");
/// ```
#[must_use]
pub fn uniform_title(title: &str) -> String {
    if !has_noise(title) {
        return title.to_string();
    }

    let stripped = PARENTHESIZED.replace_all(title, |caps: &regex::Captures<'_>| {
        if has_noise(&caps[0]) {
            String::new()
        } else {
            caps[0].to_string()
        }
    });

    let mut segments = stripped.split(" - ");
    let mut kept: Vec<&str> = segments.next().into_iter().collect();
    kept.extend(segments.filter(|segment| !has_noise(segment)));

    kept.join(" - ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn comparable_title(title: &str) -> String {
    uniform_title(title).to_lowercase()
}

/// Keep only the first track of each normalized title per artist.
///
/// A track is rejected when any of its credited artists already has a track
/// of the same normalized title, either earlier in `tracks` or anywhere in
/// `compare`. Order of the surviving tracks is preserved, and the function is
/// idempotent.
#[must_use]
pub fn remove_duplicates(tracks: &[TrackRef], compare: &[TrackRef]) -> Vec<TrackRef> {
    let mut seen: HashMap<&Uri, HashSet<String>> = HashMap::new();

    for track in compare {
        let title = comparable_title(&track.name);
        for artist in &track.artists {
            seen.entry(&artist.uri).or_default().insert(title.clone());
        }
    }

    let mut unique = Vec::with_capacity(tracks.len());
    for track in tracks {
        let title = comparable_title(&track.name);
        let duplicate = track
            .artists
            .iter()
            .any(|artist| seen.get(&artist.uri).is_some_and(|titles| titles.contains(&title)));

        if duplicate {
            trace!("Rejecting duplicate `{}' by {}", track.name, track.artist_names());
            continue;
        }

        for artist in &track.artists {
            seen.entry(&artist.uri).or_default().insert(title.clone());
        }
        unique.push(track.clone());
    }

    unique
}
