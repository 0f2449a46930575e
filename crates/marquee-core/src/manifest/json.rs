//! JSON manifest parser
//!
//! Wire schema:
//!
//! ```json
//! {
//!   "adaptationSet": {
//!     "duration": 12.5,
//!     "representations": [
//!       { "url": "...", "qualityType": "HD", "streamType": 0,
//!         "avgBitrate": 1500000, "width": 1280, "height": 720,
//!         "weight": -1, "isDefault": false, "codec": "h264",
//!         "backupUrls": ["..."] }
//!     ]
//!   }
//! }
//! ```
//!
//! Entries with an empty `url` or an unsupported `codec` tag are dropped
//! during parse. If dropping empties the set, parsing fails.

use super::ManifestParser;
use crate::{
    error::Error,
    types::{AdaptationSet, PlayList, Representation, StreamType},
    Result,
};
use serde::Deserialize;
use tracing::debug;

/// Codec tags this device can decode, in preference order
const SUPPORTED_CODECS: &[&str] = &["av1", "h265", "h264"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestDto {
    adaptation_set: AdaptationSetDto,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct AdaptationSetDto {
    duration: f64,
    representations: Vec<RepresentationDto>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RepresentationDto {
    url: String,
    quality_type: String,
    stream_type: i32,
    avg_bitrate: u64,
    width: u32,
    height: u32,
    weight: WeightDto,
    is_default: bool,
    codec: Option<String>,
    backup_urls: Vec<String>,
}

/// Wrapper so a missing `weight` defaults to "unset" rather than zero
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct WeightDto(i32);

impl Default for WeightDto {
    fn default() -> Self {
        WeightDto(-1)
    }
}

/// Parser for the JSON multi-quality manifest schema
#[derive(Debug, Default)]
pub struct JsonManifestParser;

impl JsonManifestParser {
    pub fn new() -> Self {
        Self
    }

    fn is_supported_codec(codec: Option<&str>) -> bool {
        match codec {
            // Untagged entries are assumed decodable
            None => true,
            Some(tag) => SUPPORTED_CODECS.iter().any(|c| c.eq_ignore_ascii_case(tag)),
        }
    }

    fn convert(dto: RepresentationDto) -> Option<Representation> {
        if dto.url.is_empty() {
            debug!("dropping representation with empty url");
            return None;
        }
        if !Self::is_supported_codec(dto.codec.as_deref()) {
            debug!(codec = ?dto.codec, url = %dto.url, "dropping unsupported codec");
            return None;
        }
        let stream_type = match StreamType::try_from(dto.stream_type) {
            Ok(t) => t,
            Err(reason) => {
                debug!(url = %dto.url, %reason, "dropping representation");
                return None;
            }
        };
        Some(Representation {
            url: dto.url,
            quality_type: dto.quality_type,
            stream_type,
            avg_bitrate: dto.avg_bitrate,
            width: dto.width,
            height: dto.height,
            weight: dto.weight.0,
            is_default: dto.is_default,
            backup_urls: dto.backup_urls,
        })
    }
}

impl ManifestParser for JsonManifestParser {
    fn parse(&self, raw: &str) -> Result<PlayList> {
        let dto: ManifestDto = serde_json::from_str(raw)
            .map_err(|e| Error::ManifestParse(e.to_string()))?;

        if dto.adaptation_set.duration < 0.0 {
            return Err(Error::InvalidManifest(
                "negative adaptation set duration".to_string(),
            ));
        }

        let declared = dto.adaptation_set.representations.len();
        let representations: Vec<Representation> = dto
            .adaptation_set
            .representations
            .into_iter()
            .filter_map(Self::convert)
            .collect();

        if representations.is_empty() {
            return Err(Error::InvalidManifest(format!(
                "no playable representations ({declared} declared, all dropped)"
            )));
        }

        debug!(
            kept = representations.len(),
            declared,
            "JSON manifest parsed"
        );

        Ok(PlayList {
            adaptation_set: AdaptationSet {
                duration_secs: dto.adaptation_set.duration,
                representations,
            },
        })
    }
}
