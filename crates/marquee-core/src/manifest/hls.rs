//! HLS master playlist parser
//!
//! Maps `#EXT-X-STREAM-INF` variants onto the representation model so the
//! same adaptation logic drives HLS and JSON manifests. Media playlists are
//! not an entry point here: a manifest without variants carries no quality
//! ladder to decide over.

use super::ManifestParser;
use crate::{
    error::Error,
    types::{quality_tier, AdaptationSet, PlayList, Representation, StreamType},
    Result,
};
use tracing::debug;

/// Parser for HLS multivariant (master) playlists
#[derive(Debug, Default)]
pub struct HlsManifestParser;

impl HlsManifestParser {
    pub fn new() -> Self {
        Self
    }

    /// Whether the variant's CODECS attribute names a decodable video codec.
    /// Untagged variants are assumed decodable.
    fn is_supported_codecs(codecs: Option<&str>) -> bool {
        let Some(codecs) = codecs else { return true };
        let lower = codecs.to_lowercase();
        let names_video = ["avc1", "avc3", "hvc1", "hev1", "av01", "vp09", "vp8"]
            .iter()
            .any(|tag| lower.contains(tag));
        if !names_video {
            // Audio-only variant
            return true;
        }
        lower.contains("avc1")
            || lower.contains("avc3")
            || lower.contains("hvc1")
            || lower.contains("hev1")
            || lower.contains("av01")
    }
}

impl ManifestParser for HlsManifestParser {
    fn parse(&self, raw: &str) -> Result<PlayList> {
        let master = m3u8_rs::parse_master_playlist_res(raw.as_bytes())
            .map_err(|e| Error::ManifestParse(format!("Failed to parse HLS master: {e:?}")))?;

        let declared = master.variants.len();
        let mut representations = Vec::with_capacity(declared);

        for variant in &master.variants {
            if variant.uri.is_empty() {
                debug!("dropping variant with empty uri");
                continue;
            }
            if !Self::is_supported_codecs(variant.codecs.as_deref()) {
                debug!(codecs = ?variant.codecs, uri = %variant.uri, "dropping unsupported codecs");
                continue;
            }

            let (width, height) = variant
                .resolution
                .map(|r| (r.width as u32, r.height as u32))
                .unwrap_or((0, 0));

            representations.push(Representation {
                url: variant.uri.clone(),
                quality_type: quality_tier(height).to_string(),
                stream_type: if variant.resolution.is_some() {
                    StreamType::Muxed
                } else {
                    StreamType::Audio
                },
                avg_bitrate: variant.average_bandwidth.unwrap_or(variant.bandwidth),
                width,
                height,
                // HLS carries no explicit priority attribute
                weight: -1,
                is_default: false,
                backup_urls: Vec::new(),
            });
        }

        if representations.is_empty() {
            return Err(Error::InvalidManifest(format!(
                "no playable variants ({declared} declared, all dropped)"
            )));
        }

        debug!(kept = representations.len(), declared, "HLS master parsed");

        Ok(PlayList {
            adaptation_set: AdaptationSet {
                // HLS master playlists carry no total duration
                duration_secs: 0.0,
                representations,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "#EXTM3U\n\
#EXT-X-STREAM-INF:BANDWIDTH=800000,AVERAGE-BANDWIDTH=700000,RESOLUTION=640x360,CODECS=\"avc1.640028,mp4a.40.2\"\n\
low/index.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=2800000,RESOLUTION=1280x720,CODECS=\"avc1.640028,mp4a.40.2\"\n\
mid/index.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080,CODECS=\"vp09.00.10.08\"\n\
vp9/index.m3u8\n";

    #[test]
    fn test_parse_master_playlist() {
        let playlist = HlsManifestParser::new().parse(MASTER).unwrap();
        let reps = playlist.representations();

        // vp9 variant is dropped
        assert_eq!(reps.len(), 2);
        assert_eq!(reps[0].url, "low/index.m3u8");
        assert_eq!(reps[0].avg_bitrate, 700_000);
        assert_eq!(reps[0].quality_type, "360p");
        assert_eq!(reps[1].avg_bitrate, 2_800_000);
        assert_eq!((reps[1].width, reps[1].height), (1280, 720));
        assert!(!reps[0].has_weight());
    }

    #[test]
    fn test_garbage_input_fails() {
        assert!(HlsManifestParser::new().parse("not an m3u8").is_err());
    }

    #[test]
    fn test_master_without_variants_fails() {
        assert!(HlsManifestParser::new().parse("#EXTM3U\n").is_err());
    }

    #[test]
    fn test_codec_support_matching() {
        assert!(HlsManifestParser::is_supported_codecs(Some(
            "avc1.640028,mp4a.40.2"
        )));
        assert!(HlsManifestParser::is_supported_codecs(Some("hvc1.1.6.L93.B0")));
        assert!(HlsManifestParser::is_supported_codecs(Some("av01.0.01M.08")));
        assert!(!HlsManifestParser::is_supported_codecs(Some("vp09.00.10.08")));
        assert!(HlsManifestParser::is_supported_codecs(Some("mp4a.40.2")));
        assert!(HlsManifestParser::is_supported_codecs(None));
    }
}
