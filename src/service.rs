#![forbid(unsafe_code)]

//! Video-info lookups and tracked downloads built on top of yt-dlp.

use crate::classify::{FailureKind, classify_download_failure, classify_info_failure};
use crate::config::Settings;
use crate::error::{ServiceError, ToolError};
use crate::formats::{DownloadOption, FormatExpr, StreamFormat, select_formats};
use crate::process::{ExternalTool, ToolStatus};
use crate::progress::{ProgressEvent, ProgressHub, ProgressPublisher};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";
const MERGE_CONTAINER: &str = "mp4";
const RETRIES: &str = "10";

/// Subset of `yt-dlp --dump-single-json` that the front-end needs.
#[derive(Debug, Deserialize)]
pub struct VideoInfo {
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
    #[serde(default)]
    pub formats: Vec<StreamFormat>,
}

/// Response body of a successful info lookup.
#[derive(Debug, Clone, Serialize)]
pub struct VideoSummary {
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
    pub formats: Vec<DownloadOption>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub url: Option<String>,
    pub format_id: Option<String>,
    /// Routes progress events when the hub runs in session scope.
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DownloadReport {
    pub message: String,
    pub filename: String,
    pub saved_to: PathBuf,
    pub format: String,
}

/// Orchestrates yt-dlp for metadata and downloads. Cheap to share behind an `Arc`.
pub struct Downloader {
    ytdlp: ExternalTool,
    ffmpeg: ExternalTool,
    settings: Settings,
    hub: Arc<ProgressHub>,
}

impl Downloader {
    pub fn new(settings: Settings, hub: Arc<ProgressHub>) -> Self {
        Self {
            ytdlp: ExternalTool::new(&settings.ytdlp_path),
            ffmpeg: ExternalTool::new(&settings.ffmpeg_path),
            settings,
            hub,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub async fn ytdlp_status(&self) -> ToolStatus {
        self.ytdlp.probe().await
    }

    pub async fn ffmpeg_status(&self) -> ToolStatus {
        self.ffmpeg.probe().await
    }

    pub fn cookies_present(&self) -> bool {
        self.settings.cookies_path.is_file()
    }

    /// Fetches metadata for `url` and ranks its formats.
    pub async fn fetch_info(&self, url: Option<&str>) -> Result<VideoSummary, ServiceError> {
        let url = require(url, "Please provide a YouTube URL")?;
        info!("fetching video info for {url}");

        let video = self.dump_metadata(url).await?;
        let formats = select_formats(&video.formats);
        if formats.is_empty() {
            warn!("no downloadable formats for {url}");
            return Err(ServiceError::NoSuitableFormat);
        }

        info!(
            "{} unique formats for {:?}: {}",
            formats.len(),
            video.title.as_deref().unwrap_or_default(),
            formats
                .iter()
                .map(|option| format!(
                    "{}({}p,{},{})",
                    option.format_id,
                    option.height,
                    option.protocol.as_deref().unwrap_or("?"),
                    if option.compatible { "RELIABLE" } else { "RISKY" }
                ))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(VideoSummary {
            title: video.title,
            thumbnail: video.thumbnail,
            duration: video.duration,
            formats,
        })
    }

    /// Downloads `request.format_id` of `request.url` into the output
    /// directory, publishing progress while yt-dlp runs.
    pub async fn download(&self, request: &DownloadRequest) -> Result<DownloadReport, ServiceError> {
        let (Some(url), Some(format_id)) = (
            non_blank(request.url.as_deref()),
            non_blank(request.format_id.as_deref()),
        ) else {
            return Err(ServiceError::InvalidInput(
                "Please provide both URL and format ID",
            ));
        };

        let publisher = ProgressPublisher::new(self.hub.clone(), request.session_id.clone());
        let result = self.download_inner(url, format_id, &publisher).await;
        match &result {
            Ok(report) => info!("download of {url} ({}) completed", report.format),
            Err(err) => error!("download of {url} failed: {}", err.details()),
        }
        result
    }

    async fn download_inner(
        &self,
        url: &str,
        format_id: &str,
        publisher: &ProgressPublisher,
    ) -> Result<DownloadReport, ServiceError> {
        let output_dir = self.prepare_output_dir().await?;
        info!("saving {url} as format {format_id} into {}", output_dir.display());
        publisher.publish(ProgressEvent::starting());

        let expr = match self.resolve_format(url, format_id).await {
            Ok(expr) => expr,
            Err(err) => {
                publisher.publish(ProgressEvent::error(err.details()));
                return Err(err);
            }
        };

        if let status @ (ToolStatus::Missing(_) | ToolStatus::Failed(_)) = self.ffmpeg.probe().await
        {
            let err = ServiceError::MuxerUnavailable {
                program: self.ffmpeg.program().display().to_string(),
                reason: format!("{status:?}"),
            };
            publisher.publish(ProgressEvent::error(err.to_string()));
            return Err(err);
        }

        let args = self.download_args(&expr, &output_dir, url);
        let format = expr.to_string();
        self.ytdlp
            .run(&args, Some(publisher))
            .await
            .map_err(|source| download_failure(source, format_id))?;

        Ok(DownloadReport {
            message: "✅ Download completed successfully!".to_string(),
            filename: "Video downloaded with original title".to_string(),
            saved_to: output_dir,
            format,
        })
    }

    /// Single video-only ids get the best audio stream merged in.
    async fn resolve_format(&self, url: &str, format_id: &str) -> Result<FormatExpr, ServiceError> {
        let expr = FormatExpr::parse(format_id);
        if expr.is_combined() {
            return Ok(expr);
        }

        let video = self
            .dump_metadata(url)
            .await
            .map_err(|err| match err {
                ServiceError::ExternalTool { source, .. } => download_failure(source, format_id),
                other => other,
            })?;
        let resolved = expr.with_audio_from(&video.formats);
        if resolved.is_combined() {
            info!("adding audio to video-only format: {resolved}");
        }
        Ok(resolved)
    }

    async fn dump_metadata(&self, url: &str) -> Result<VideoInfo, ServiceError> {
        let args = vec![
            "--dump-single-json".to_string(),
            "--no-warnings".to_string(),
            url.to_string(),
        ];
        let stdout = self.ytdlp.run(&args, None).await.map_err(info_failure)?;
        Ok(serde_json::from_str(stdout.trim())?)
    }

    async fn prepare_output_dir(&self) -> Result<PathBuf, ServiceError> {
        let dir = self.settings.output_dir.clone();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| ServiceError::Storage {
                path: dir.clone(),
                source,
            })?;
        Ok(dir)
    }

    fn download_args(&self, expr: &FormatExpr, output_dir: &Path, url: &str) -> Vec<String> {
        let template = output_dir.join(OUTPUT_TEMPLATE);
        let mut args: Vec<String> = vec![
            "--format".into(),
            expr.to_string(),
            "--output".into(),
            template.to_string_lossy().replace('\\', "/"),
            "--merge-output-format".into(),
            MERGE_CONTAINER.into(),
            "--embed-thumbnail".into(),
            "--add-metadata".into(),
            "--no-warnings".into(),
            "--restrict-filenames".into(),
            "--retries".into(),
            RETRIES.into(),
            "--fragment-retries".into(),
            RETRIES.into(),
            "--skip-unavailable-fragments".into(),
            "--no-keep-video".into(),
            "--prefer-ffmpeg".into(),
        ];

        if self.settings.has_custom_ffmpeg() {
            args.push("--ffmpeg-location".into());
            args.push(self.settings.ffmpeg_path.to_string_lossy().into_owned());
        }
        if self.cookies_present() {
            info!("using cookies from {}", self.settings.cookies_path.display());
            args.push("--cookies".into());
            args.push(self.settings.cookies_path.to_string_lossy().into_owned());
        }

        args.push(url.to_string());
        args
    }
}

fn require<'a>(value: Option<&'a str>, message: &'static str) -> Result<&'a str, ServiceError> {
    non_blank(value).ok_or(ServiceError::InvalidInput(message))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn info_failure(source: ToolError) -> ServiceError {
    let kind = classify_info_failure(&source.diagnostic());
    ServiceError::ExternalTool {
        kind,
        message: kind.user_message(None),
        source,
    }
}

/// `format` is the id the user asked for, not the merge expression built from it.
fn download_failure(source: ToolError, format: &str) -> ServiceError {
    let kind: FailureKind = classify_download_failure(&source.diagnostic(), format);
    ServiceError::ExternalTool {
        kind,
        message: kind.user_message(Some(format)),
        source,
    }
}
