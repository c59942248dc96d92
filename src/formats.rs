#![forbid(unsafe_code)]

//! Turns yt-dlp's raw `formats` array into the short, ranked list of download
//! options shown to the user.
//!
//! Ranking is a sum of fixed penalties (lower is better). The penalties favour
//! plain HTTPS MP4/H.264 streams that carry audio and are not oversized, since
//! those are the ones that download and play back most reliably.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Options whose priority is below this value are flagged as compatible.
pub const COMPATIBLE_THRESHOLD: u32 = 10;
/// Formats shorter than this are never offered.
pub const MIN_HEIGHT: i64 = 144;
/// yt-dlp selector used when no concrete audio-only format is known.
pub const BEST_AUDIO_SELECTOR: &str = "bestaudio";

const NO_CODEC: &str = "none";
const AUDIO_ONLY_NOTE: &str = "DASH audio";

/// One entry of the `formats` array in `yt-dlp --dump-single-json`.
///
/// Every field is optional because extractors differ wildly in what they fill in.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamFormat {
    pub format_id: Option<String>,
    pub ext: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub fps: Option<f64>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub filesize: Option<i64>,
    pub filesize_approx: Option<i64>,
    pub protocol: Option<String>,
    pub format_note: Option<String>,
    pub url: Option<String>,
}

impl StreamFormat {
    pub fn has_video(&self) -> bool {
        codec_present(self.vcodec.as_deref())
    }

    pub fn has_audio(&self) -> bool {
        codec_present(self.acodec.as_deref())
    }

    pub fn height_or_zero(&self) -> i64 {
        self.height.unwrap_or(0)
    }

    /// Exact size when yt-dlp knows it, otherwise its estimate.
    pub fn size_estimate(&self) -> i64 {
        self.filesize.or(self.filesize_approx).unwrap_or(0)
    }

    fn transport(&self) -> Transport {
        Transport::classify(self.protocol.as_deref())
    }

    fn codec_family(&self) -> CodecFamily {
        CodecFamily::classify(self.vcodec.as_deref())
    }
}

fn codec_present(codec: Option<&str>) -> bool {
    matches!(codec, Some(value) if !value.is_empty() && value != NO_CODEC)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Transport {
    Https,
    Hls,
    Storyboard,
    Other,
}

impl Transport {
    fn classify(protocol: Option<&str>) -> Self {
        match protocol {
            Some("https") => Self::Https,
            Some(value) if value.starts_with("m3u8") => Self::Hls,
            Some("mhtml") => Self::Storyboard,
            _ => Self::Other,
        }
    }

    fn penalty(self) -> u32 {
        match self {
            Self::Https => 0,
            Self::Hls => 20,
            Self::Storyboard | Self::Other => 15,
        }
    }

    fn marker(self) -> &'static str {
        match self {
            Self::Https => "🟢",
            Self::Hls => "🟡",
            Self::Storyboard | Self::Other => "🔴",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CodecFamily {
    H264,
    Vp9,
    Other,
}

impl CodecFamily {
    fn classify(vcodec: Option<&str>) -> Self {
        let Some(codec) = vcodec else {
            return Self::Other;
        };
        let codec = codec.to_ascii_lowercase();
        if codec.contains("avc1") || codec.contains("h264") {
            Self::H264
        } else if codec.contains("vp9") || codec.contains("vp09") {
            Self::Vp9
        } else {
            Self::Other
        }
    }

    fn penalty(self) -> u32 {
        match self {
            Self::H264 => 0,
            Self::Vp9 => 5,
            Self::Other => 15,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::H264 => "/H.264",
            Self::Vp9 => "/VP9",
            Self::Other => "",
        }
    }
}

fn container_penalty(ext: Option<&str>) -> u32 {
    match ext {
        Some("mp4") => 0,
        Some("webm") => 10,
        _ => 20,
    }
}

fn audio_penalty(has_audio: bool) -> u32 {
    if has_audio { 0 } else { 2 }
}

fn resolution_penalty(height: i64) -> u32 {
    match height {
        h if h >= 2160 => 15,
        h if h >= 1440 => 8,
        h if h >= 1080 => 3,
        _ => 0,
    }
}

/// Additive priority score for a single format. Lower is better.
pub fn priority(format: &StreamFormat) -> u32 {
    format.transport().penalty()
        + container_penalty(format.ext.as_deref())
        + format.codec_family().penalty()
        + audio_penalty(format.has_audio())
        + resolution_penalty(format.height_or_zero())
}

/// Whether a raw format is something we can actually offer for download.
pub fn is_downloadable(format: &StreamFormat) -> bool {
    let has_url = format
        .url
        .as_deref()
        .is_some_and(|url| !url.trim().is_empty());
    let audio_only_note = format
        .format_note
        .as_deref()
        .is_some_and(|note| note.contains(AUDIO_ONLY_NOTE));

    format.has_video()
        && format.height_or_zero() >= MIN_HEIGHT
        && has_url
        && !audio_only_note
        && format.transport() != Transport::Storyboard
}

/// User-facing download choice derived from a [`StreamFormat`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadOption {
    pub format_id: String,
    pub ext: String,
    pub resolution: String,
    pub height: i64,
    pub filesize: i64,
    pub quality: String,
    pub fps: Option<f64>,
    pub vcodec: Option<String>,
    pub acodec: String,
    pub has_audio: bool,
    pub protocol: Option<String>,
    pub format_note: String,
    pub priority: u32,
    pub compatible: bool,
}

impl DownloadOption {
    pub fn from_format(format: &StreamFormat) -> Self {
        let has_audio = format.has_audio();
        let height = format.height_or_zero();
        let priority = priority(format);

        Self {
            format_id: format.format_id.clone().unwrap_or_default(),
            ext: format.ext.clone().unwrap_or_else(|| "mp4".to_string()),
            resolution: format!("{}x{}", format.width.unwrap_or(0), height),
            height,
            filesize: format.size_estimate(),
            quality: quality_label(format),
            fps: format.fps,
            vcodec: format.vcodec.clone(),
            acodec: if has_audio {
                format.acodec.clone().unwrap_or_default()
            } else {
                NO_CODEC.to_string()
            },
            has_audio,
            protocol: format.protocol.clone(),
            format_note: format.format_note.clone().unwrap_or_default(),
            priority,
            compatible: priority < COMPATIBLE_THRESHOLD,
        }
    }
}

/// Renders labels such as `1080p 30fps (video only) [MP4/H.264] 🟢`.
fn quality_label(format: &StreamFormat) -> String {
    let mut label = format!("{}p", format.height_or_zero());
    if let Some(fps) = format.fps {
        label.push_str(&format!(" {fps}fps"));
    }
    if !format.has_audio() {
        label.push_str(" (video only)");
    }
    let ext = format.ext.as_deref().unwrap_or_default().to_ascii_uppercase();
    label.push_str(&format!(
        " [{ext}{}] {}",
        format.codec_family().label(),
        format.transport().marker()
    ));
    label
}

/// Filters, scores and deduplicates raw formats.
///
/// The result holds at most one option per height, ordered by descending
/// height. For each height the lowest-priority candidate survives.
pub fn select_formats(raw: &[StreamFormat]) -> Vec<DownloadOption> {
    let mut candidates: Vec<DownloadOption> = raw
        .iter()
        .filter(|format| is_downloadable(format))
        .map(DownloadOption::from_format)
        .collect();

    // Stable sort keeps yt-dlp's order among exact ties.
    candidates.sort_by(|a, b| {
        b.height
            .cmp(&a.height)
            .then_with(|| a.priority.cmp(&b.priority))
    });

    let mut seen_heights = HashSet::new();
    candidates.retain(|option| seen_heights.insert(option.height));
    candidates
}

/// Picks the largest audio-only stream. The first one wins on equal sizes.
pub fn best_audio(raw: &[StreamFormat]) -> Option<&StreamFormat> {
    let mut best: Option<&StreamFormat> = None;
    for format in raw
        .iter()
        .filter(|format| format.has_audio() && !format.has_video())
    {
        match best {
            Some(current) if format.size_estimate() <= current.size_estimate() => {}
            _ => best = Some(format),
        }
    }
    best
}

/// A yt-dlp `--format` expression: either one format id or a video id merged
/// with an audio id/selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatExpr {
    Single(String),
    Combined { video: String, audio: String },
}

impl FormatExpr {
    pub fn parse(value: &str) -> Self {
        match value.split_once('+') {
            Some((video, audio)) => Self::Combined {
                video: video.to_string(),
                audio: audio.to_string(),
            },
            None => Self::Single(value.to_string()),
        }
    }

    pub fn is_combined(&self) -> bool {
        matches!(self, Self::Combined { .. })
    }

    /// Upgrades a single id to a merge expression when the matching raw format
    /// carries no audio. Unknown ids and combined expressions pass through.
    pub fn with_audio_from(self, raw: &[StreamFormat]) -> Self {
        let id = match self {
            Self::Single(id) => id,
            combined => return combined,
        };
        let selected = raw
            .iter()
            .find(|format| format.format_id.as_deref() == Some(id.as_str()));
        match selected {
            Some(format) if !format.has_audio() => {
                let audio = best_audio(raw)
                    .and_then(|audio| audio.format_id.clone())
                    .unwrap_or_else(|| BEST_AUDIO_SELECTOR.to_string());
                Self::Combined { video: id, audio }
            }
            _ => Self::Single(id),
        }
    }
}

impl fmt::Display for FormatExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(id) => write!(f, "{id}"),
            Self::Combined { video, audio } => write!(f, "{video}+{audio}"),
        }
    }
}
