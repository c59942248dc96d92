#![forbid(unsafe_code)]

//! Maps yt-dlp's stderr onto a small set of user-facing failure causes.
//!
//! Rules are checked top to bottom and the first substring hit wins, so the
//! more specific patterns come first.

/// Known failure causes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    PrivateVideo,
    VideoUnavailable,
    VideoNotFound,
    MetadataFailed,
    HighQualityBlocked,
    AccessDenied,
    RateLimited,
    FormatUnavailable,
    NoVideoFormats,
    Network,
    Muxer,
    DownloadFailed,
}

struct Rule {
    needle: &'static str,
    kind: FailureKind,
}

const fn rule(needle: &'static str, kind: FailureKind) -> Rule {
    Rule { needle, kind }
}

const INFO_RULES: &[Rule] = &[
    rule("Private video", FailureKind::PrivateVideo),
    rule("Video unavailable", FailureKind::VideoUnavailable),
    rule("not found", FailureKind::VideoNotFound),
];

const DOWNLOAD_RULES: &[Rule] = &[
    rule("HTTP Error 403", FailureKind::AccessDenied),
    rule("HTTP Error 429", FailureKind::RateLimited),
    rule("Requested format is not available", FailureKind::FormatUnavailable),
    rule("No video formats", FailureKind::NoVideoFormats),
    rule("Network", FailureKind::Network),
    rule("ffmpeg", FailureKind::Muxer),
];

/// Format ids YouTube commonly refuses without cookies (1440p/2160p VP9).
const HIGH_QUALITY_FORMAT_IDS: &[&str] = &["625", "313", "271"];

fn first_match(rules: &[Rule], text: &str) -> Option<FailureKind> {
    rules
        .iter()
        .find(|rule| text.contains(rule.needle))
        .map(|rule| rule.kind)
}

/// Classifies a failed metadata fetch.
pub fn classify_info_failure(stderr: &str) -> FailureKind {
    first_match(INFO_RULES, stderr).unwrap_or(FailureKind::MetadataFailed)
}

/// Classifies a failed download of `format` (the requested expression).
pub fn classify_download_failure(stderr: &str, format: &str) -> FailureKind {
    match first_match(DOWNLOAD_RULES, stderr) {
        Some(FailureKind::AccessDenied)
            if HIGH_QUALITY_FORMAT_IDS.iter().any(|id| format.contains(id)) =>
        {
            FailureKind::HighQualityBlocked
        }
        Some(kind) => kind,
        None => FailureKind::DownloadFailed,
    }
}

impl FailureKind {
    /// Short message shown to the user. `format` names the requested format
    /// where the message refers to it.
    pub fn user_message(self, format: Option<&str>) -> String {
        match self {
            Self::PrivateVideo => "🔒 This video is private and cannot be accessed".into(),
            Self::VideoUnavailable => "❌ This video is unavailable or has been removed".into(),
            Self::VideoNotFound => "🔍 Video not found - please check the URL".into(),
            Self::MetadataFailed => "Failed to get video information".into(),
            Self::HighQualityBlocked => "🚫 High-quality format blocked by YouTube. Try a lower quality or use cookies for authentication.".into(),
            Self::AccessDenied => "🚫 Access denied - YouTube blocked the request. Try again later or use cookies.".into(),
            Self::RateLimited => {
                "⏳ Too many requests - please wait a few minutes before trying again".into()
            }
            Self::FormatUnavailable => format!(
                "❌ Format {} is not available for this video. YouTube may have limited high-quality formats. Try a different quality.",
                format.unwrap_or("unknown")
            ),
            Self::NoVideoFormats => "📺 No suitable video format found for download".into(),
            Self::Network => "🌐 Network error - please check your internet connection".into(),
            Self::Muxer => {
                "🔧 FFmpeg error - there may be an issue with video/audio merging".into()
            }
            Self::DownloadFailed => "Download failed".into(),
        }
    }
}
