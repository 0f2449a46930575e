//! Core types for the Marquee decision engine
//!
//! The manifest model is a single-owner value tree:
//! `PlayList` -> `AdaptationSet` -> `Representation`s. Once a parser has
//! produced a `PlayList` it is never mutated in place; a refreshed manifest
//! is a new tree.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Stream content classifier for a representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum StreamType {
    Video,
    Audio,
    /// Interleaved audio+video in one stream
    Muxed,
}

impl From<StreamType> for i32 {
    fn from(value: StreamType) -> Self {
        match value {
            StreamType::Video => 0,
            StreamType::Audio => 1,
            StreamType::Muxed => 2,
        }
    }
}

impl TryFrom<i32> for StreamType {
    type Error = String;

    fn try_from(value: i32) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(StreamType::Video),
            1 => Ok(StreamType::Audio),
            2 => Ok(StreamType::Muxed),
            other => Err(format!("unknown stream type {other}")),
        }
    }
}

impl Default for StreamType {
    fn default() -> Self {
        StreamType::Muxed
    }
}

impl std::fmt::Display for StreamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamType::Video => write!(f, "video"),
            StreamType::Audio => write!(f, "audio"),
            StreamType::Muxed => write!(f, "muxed"),
        }
    }
}

/// One playable quality variant of a piece of content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Representation {
    /// Primary fetch location
    pub url: String,
    /// Source-defined quality label, e.g. "SD" / "HD" / "720p"
    pub quality_type: String,
    /// Audio/video/muxed classifier
    pub stream_type: StreamType,
    /// Average bitrate in bits per second
    pub avg_bitrate: u64,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Manifest-declared priority; negative means "no explicit priority"
    pub weight: i32,
    /// Marked as the default variant by the manifest
    pub is_default: bool,
    /// Fallback locations, tried in declaration order if the primary fails
    pub backup_urls: Vec<String>,
}

impl Representation {
    /// Pixel area used for comparator tie-breaking
    pub fn pixel_area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Whether the manifest declared an explicit priority
    pub fn has_weight(&self) -> bool {
        self.weight >= 0
    }

    /// Primary URL followed by backups, joined with `;`
    pub fn url_list(&self) -> String {
        let mut list = self.url.clone();
        for backup in &self.backup_urls {
            list.push(';');
            list.push_str(backup);
        }
        list
    }
}

/// A group of mutually interchangeable representations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationSet {
    /// Content duration in seconds; 0 means live/unknown
    pub duration_secs: f64,
    /// Variants in manifest declaration order, never sorted
    pub representations: Vec<Representation>,
}

/// Root of the manifest model, exclusively owning one adaptation set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayList {
    pub adaptation_set: AdaptationSet,
}

impl PlayList {
    /// All representations in declaration order
    pub fn representations(&self) -> &[Representation] {
        &self.adaptation_set.representations
    }

    pub fn is_empty(&self) -> bool {
        self.adaptation_set.representations.is_empty()
    }
}

/// Total order over representations: "greater" means "better".
///
/// Explicit weights win when both are set and differ; otherwise larger pixel
/// area wins. Equal weight and area compare `Equal` so that any sort using
/// this comparator is stable with respect to declaration order.
pub fn compare_representations(a: &Representation, b: &Representation) -> Ordering {
    if a.has_weight() && b.has_weight() && a.weight != b.weight {
        return a.weight.cmp(&b.weight);
    }
    a.pixel_area().cmp(&b.pixel_area())
}

/// Index of the maximal representation under the comparator.
///
/// Single linear scan; on ties the earliest-declared entry wins.
pub fn best_index(representations: &[Representation]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, rep) in representations.iter().enumerate() {
        match best {
            None => best = Some(i),
            Some(j) => {
                if compare_representations(rep, &representations[j]) == Ordering::Greater {
                    best = Some(i);
                }
            }
        }
    }
    best
}

/// Index of the minimal representation under the comparator.
///
/// Single linear scan; on ties the earliest-declared entry wins.
pub fn lowest_index(representations: &[Representation]) -> Option<usize> {
    let mut lowest: Option<usize> = None;
    for (i, rep) in representations.iter().enumerate() {
        match lowest {
            None => lowest = Some(i),
            Some(j) => {
                if compare_representations(rep, &representations[j]) == Ordering::Less {
                    lowest = Some(i);
                }
            }
        }
    }
    lowest
}

/// Quality tier label for a frame height, used when a manifest carries no
/// explicit quality tag
pub fn quality_tier(height: u32) -> &'static str {
    match height {
        0..=240 => "240p",
        241..=360 => "360p",
        361..=480 => "480p",
        481..=720 => "720p",
        721..=1080 => "1080p",
        1081..=1440 => "1440p",
        _ => "4K",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rep(url: &str, bitrate: u64, width: u32, height: u32, weight: i32) -> Representation {
        Representation {
            url: url.to_string(),
            quality_type: quality_tier(height).to_string(),
            stream_type: StreamType::Muxed,
            avg_bitrate: bitrate,
            width,
            height,
            weight,
            is_default: false,
            backup_urls: Vec::new(),
        }
    }

    #[test]
    fn test_weight_beats_area() {
        let a = rep("a", 500_000, 1920, 1080, 1);
        let b = rep("b", 500_000, 640, 360, 5);
        assert_eq!(compare_representations(&a, &b), Ordering::Less);
        assert_eq!(compare_representations(&b, &a), Ordering::Greater);
    }

    #[test]
    fn test_unset_weight_falls_back_to_area() {
        let a = rep("a", 500_000, 640, 360, -1);
        let b = rep("b", 1_500_000, 1280, 720, 7);
        assert_eq!(compare_representations(&a, &b), Ordering::Less);

        let c = rep("c", 1_500_000, 1280, 720, -1);
        assert_eq!(compare_representations(&a, &c), Ordering::Less);
    }

    #[test]
    fn test_equal_weight_and_area_is_equal() {
        let a = rep("a", 500_000, 1280, 720, 3);
        let b = rep("b", 900_000, 1280, 720, 3);
        assert_eq!(compare_representations(&a, &b), Ordering::Equal);
        assert_eq!(compare_representations(&b, &a), Ordering::Equal);
    }

    #[test]
    fn test_comparator_is_irreflexive_for_strict_order() {
        let a = rep("a", 500_000, 1280, 720, 3);
        assert_eq!(compare_representations(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_comparator_transitivity() {
        let low = rep("low", 1, 640, 360, -1);
        let mid = rep("mid", 1, 1280, 720, -1);
        let high = rep("high", 1, 1920, 1080, -1);
        assert_eq!(compare_representations(&low, &mid), Ordering::Less);
        assert_eq!(compare_representations(&mid, &high), Ordering::Less);
        assert_eq!(compare_representations(&low, &high), Ordering::Less);
    }

    #[test]
    fn test_best_and_lowest_index() {
        let reps = vec![
            rep("a", 500_000, 640, 360, -1),
            rep("b", 1_500_000, 1280, 720, -1),
            rep("c", 800_000, 854, 480, -1),
        ];
        assert_eq!(best_index(&reps), Some(1));
        assert_eq!(lowest_index(&reps), Some(0));
    }

    #[test]
    fn test_ties_keep_declaration_order() {
        let reps = vec![
            rep("first", 500_000, 1280, 720, -1),
            rep("second", 900_000, 1280, 720, -1),
        ];
        assert_eq!(best_index(&reps), Some(0));
        assert_eq!(lowest_index(&reps), Some(0));
    }

    #[test]
    fn test_empty_slice_has_no_best() {
        assert_eq!(best_index(&[]), None);
        assert_eq!(lowest_index(&[]), None);
    }

    #[test]
    fn test_url_list_preserves_backup_order() {
        let mut r = rep("https://cdn.example.com/a.mp4", 1, 1, 1, -1);
        r.backup_urls = vec![
            "https://backup1.example.com/a.mp4".to_string(),
            "https://backup2.example.com/a.mp4".to_string(),
        ];
        assert_eq!(
            r.url_list(),
            "https://cdn.example.com/a.mp4;https://backup1.example.com/a.mp4;https://backup2.example.com/a.mp4"
        );
    }

    #[test]
    fn test_quality_tier() {
        assert_eq!(quality_tier(360), "360p");
        assert_eq!(quality_tier(720), "720p");
        assert_eq!(quality_tier(1080), "1080p");
        assert_eq!(quality_tier(2160), "4K");
    }
}
