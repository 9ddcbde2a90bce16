//! Input model: stories and their derived decade grouping.

use serde::{Deserialize, Serialize};

/// A single narrative unit.
///
/// Stories are immutable inputs to pagination; the engine never mutates or
/// persists them. A missing body is represented as an empty string and lays
/// out as zero text lines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Story {
    /// Stable story identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Free-text body. Empty means a title/date-only page.
    #[serde(default)]
    pub body: String,
    /// Associated photos, if any. The first photo reserves the photo block
    /// on the story's start page.
    #[serde(default)]
    pub photos: Vec<PhotoRef>,
    /// Year the story took place.
    pub year: i32,
    /// Optional decade label override (e.g. "The War Years"). When absent
    /// the label derives from `year`.
    #[serde(default)]
    pub decade: Option<String>,
    /// Optional narration recording. Reserves the audio-player block on the
    /// start page.
    #[serde(default)]
    pub audio: Option<AudioRef>,
}

impl Story {
    /// Whether the start page must reserve the photo block.
    pub fn has_photo(&self) -> bool {
        !self.photos.is_empty()
    }

    /// The hero photo shown on the start page, when present.
    pub fn hero_photo(&self) -> Option<&PhotoRef> {
        self.photos
            .iter()
            .find(|photo| photo.is_hero)
            .or_else(|| self.photos.first())
    }

    /// Decade label for grouping, honoring the per-story override.
    pub fn decade_label(&self) -> String {
        self.decade
            .clone()
            .unwrap_or_else(|| decade_label_for_year(self.year))
    }
}

/// Reference to a story photo.
///
/// Whether the image loads is a rendering concern; pagination reserves space
/// for it regardless.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhotoRef {
    /// Storage path or URL.
    pub src: String,
    /// Optional caption text.
    #[serde(default)]
    pub caption: Option<String>,
    /// Marks the photo shown on the start page when several exist.
    #[serde(default)]
    pub is_hero: bool,
}

/// Reference to a story's narration recording.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioRef {
    /// Storage path or URL.
    pub src: String,
    /// Recording length, when known.
    #[serde(default)]
    pub duration_secs: Option<u32>,
}

/// Canonical decade label for a year, e.g. `1953 -> "1950s"`.
pub fn decade_label_for_year(year: i32) -> String {
    let start = year - year.rem_euclid(10);
    format!("{start}s")
}

/// First year of the decade containing `year`.
pub fn decade_start_year(year: i32) -> i32 {
    year - year.rem_euclid(10)
}

/// Stories sharing a decade label, in chronological order.
///
/// Derived, never stored: recomputed from the story collection on each
/// pagination run.
#[derive(Clone, Debug, PartialEq)]
pub struct DecadeGroup {
    /// Display label for the decade-marker page.
    pub label: String,
    /// First year of the decade (for ordering and display).
    pub start_year: i32,
    /// Member stories in chronological order.
    pub stories: Vec<Story>,
}

impl DecadeGroup {
    /// Sort stories chronologically and group consecutive stories that share
    /// a decade label.
    ///
    /// Ordering is `(year, id)` so equal-year stories stay in a stable,
    /// deterministic order across runs.
    pub fn group(stories: &[Story]) -> Vec<DecadeGroup> {
        let mut sorted: Vec<Story> = stories.to_vec();
        sorted.sort_by(|a, b| a.year.cmp(&b.year).then_with(|| a.id.cmp(&b.id)));

        let mut groups: Vec<DecadeGroup> = Vec::new();
        for story in sorted {
            let label = story.decade_label();
            match groups.last_mut() {
                Some(group) if group.label == label => group.stories.push(story),
                _ => groups.push(DecadeGroup {
                    label,
                    start_year: decade_start_year(story.year),
                    stories: vec![story],
                }),
            }
        }
        groups
    }
}
