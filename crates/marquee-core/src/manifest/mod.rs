//! Manifest parsing for the JSON multi-quality schema and HLS master playlists

mod hls;
mod json;

pub use hls::HlsManifestParser;
pub use json::JsonManifestParser;

use crate::{PlayList, Result};

/// Manifest wire formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Json,
    Hls,
}

/// Trait for manifest parsers.
///
/// Parsing is pure and synchronous: no I/O, no shared mutable state. A
/// successful parse always yields a non-empty playlist; any structural
/// violation fails atomically without exposing a partial tree.
pub trait ManifestParser: Send + Sync {
    /// Parse a full manifest payload into a playlist
    fn parse(&self, raw: &str) -> Result<PlayList>;
}

/// Detect the manifest format from payload content
pub fn detect_format(raw: &str) -> ManifestFormat {
    let trimmed = raw.trim_start();
    if trimmed.starts_with("#EXTM3U") {
        return ManifestFormat::Hls;
    }
    ManifestFormat::Json
}

/// Create the appropriate parser for a manifest format
pub fn create_parser(format: ManifestFormat) -> Box<dyn ManifestParser> {
    match format {
        ManifestFormat::Json => Box::new(JsonManifestParser::new()),
        ManifestFormat::Hls => Box::new(HlsManifestParser::new()),
    }
}
