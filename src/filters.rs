//! Attribute filters over catalog tracks.
//!
//! A filter keeps or rejects a track based on one attribute. Boolean
//! attributes pass when set, numeric attributes pass when they fall inside the
//! configured bounds. `reverse` inverts either test.

use crate::model::Track;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Explicit,
    MultipleArtists,
    /// Milliseconds.
    Duration,
    /// Position on the album.
    TrackNumber,
    /// 0-100.
    Popularity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Boolean,
    Integer,
    Percentage,
}

impl Attribute {
    #[must_use]
    pub const fn kind(self) -> AttributeKind {
        match self {
            Self::Explicit | Self::MultipleArtists => AttributeKind::Boolean,
            Self::Duration | Self::TrackNumber => AttributeKind::Integer,
            Self::Popularity => AttributeKind::Percentage,
        }
    }

    fn flag(self, track: &Track) -> bool {
        match self {
            Self::Explicit => track.explicit,
            Self::MultipleArtists => track.artists.len() > 1,
            _ => false,
        }
    }

    fn value(self, track: &Track) -> f64 {
        match self {
            Self::Duration => f64::from(track.duration_ms),
            Self::TrackNumber => f64::from(track.track_number),
            Self::Popularity => f64::from(track.popularity),
            Self::Explicit | Self::MultipleArtists => f64::from(u8::from(self.flag(track))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeFilter {
    pub attribute: Attribute,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub reverse: bool,
}

impl AttributeFilter {
    /// Build a validated filter.
    ///
    /// # Errors
    ///
    /// Percentage attributes only accept limits within 0..=100, and `min`
    /// may not exceed `max`.
    pub fn new(attribute: Attribute, min: Option<f64>, max: Option<f64>, reverse: bool) -> Result<Self> {
        let filter = Self {
            attribute,
            min,
            max,
            reverse,
        };
        filter.validate()?;
        Ok(filter)
    }

    /// Keep only tracks with the boolean `attribute` unset.
    #[must_use]
    pub fn exclude(attribute: Attribute) -> Self {
        Self {
            attribute,
            min: None,
            max: None,
            reverse: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for limit in [self.min, self.max].into_iter().flatten() {
            if limit.is_nan() {
                bail!("Invalid limit for {:?}: NaN", self.attribute);
            }
            if self.attribute.kind() == AttributeKind::Percentage && !(0.0..=100.0).contains(&limit) {
                bail!(
                    "Invalid limit for a percentage attribute ({:?}, min: {:?}, max: {:?})",
                    self.attribute,
                    self.min,
                    self.max
                );
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                bail!("Filter on {:?} has min {min} above max {max}", self.attribute);
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn matches(&self, track: &Track) -> bool {
        let pass = match self.attribute.kind() {
            AttributeKind::Boolean => self.attribute.flag(track),
            AttributeKind::Integer | AttributeKind::Percentage => {
                let value = self.attribute.value(track);
                self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
            }
        };
        pass != self.reverse
    }
}

/// Whether `track` passes every filter.
#[must_use]
pub fn passes_all(filters: &[AttributeFilter], track: &Track) -> bool {
    filters.iter().all(|f| f.matches(track))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlbumRef, ArtistRef, Uri};

    fn track(popularity: u8, explicit: bool, artists: usize) -> Track {
        Track {
            uri: Uri::from("t:1"),
            name: "T".into(),
            popularity,
            artists: (0..artists).map(|i| ArtistRef::new(format!("a:{i}").as_str(), "A")).collect(),
            album: AlbumRef::new("al:1", "Al"),
            duration_ms: 240_000,
            track_number: 3,
            explicit,
        }
    }

    #[test]
    fn test_boolean_filters() {
        let no_explicit = AttributeFilter::exclude(Attribute::Explicit);
        assert!(no_explicit.matches(&track(50, false, 1)));
        assert!(!no_explicit.matches(&track(50, true, 1)));

        let collabs = AttributeFilter::new(Attribute::MultipleArtists, None, None, false).unwrap();
        assert!(collabs.matches(&track(50, false, 2)));
        assert!(!collabs.matches(&track(50, false, 1)));
    }

    #[test]
    fn test_numeric_bounds_inclusive() {
        let popular = AttributeFilter::new(Attribute::Popularity, Some(40.0), Some(60.0), false).unwrap();
        assert!(popular.matches(&track(40, false, 1)));
        assert!(popular.matches(&track(60, false, 1)));
        assert!(!popular.matches(&track(61, false, 1)));

        let reversed = AttributeFilter { reverse: true, ..popular };
        assert!(reversed.matches(&track(61, false, 1)));

        let short = AttributeFilter::new(Attribute::Duration, None, Some(180_000.0), false).unwrap();
        assert!(!short.matches(&track(50, false, 1)));
    }

    #[test]
    fn test_invalid_limits_rejected() {
        assert!(AttributeFilter::new(Attribute::Popularity, Some(-1.0), None, false).is_err());
        assert!(AttributeFilter::new(Attribute::Popularity, None, Some(101.0), false).is_err());
        assert!(AttributeFilter::new(Attribute::TrackNumber, Some(5.0), Some(2.0), false).is_err());
        assert!(AttributeFilter::new(Attribute::Duration, Some(500_000.0), None, false).is_ok());
    }

    #[test]
    fn test_passes_all() {
        let filters = vec![
            AttributeFilter::exclude(Attribute::Explicit),
            AttributeFilter::new(Attribute::Popularity, Some(30.0), None, false).unwrap(),
        ];
        assert!(passes_all(&filters, &track(30, false, 1)));
        assert!(!passes_all(&filters, &track(29, false, 1)));
        assert!(passes_all(&[], &track(0, true, 1)));
    }
}
