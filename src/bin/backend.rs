#![forbid(unsafe_code)]

//! HTTP front-end for yt-dlp.
//!
//! Serves the single-page UI, answers format lookups, runs downloads and
//! streams their progress to the browser over server-sent events.

use std::{
    net::SocketAddr,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Body,
    extract::{Query, State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, Request, StatusCode, header},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use clap::Parser;
use futures_util::{Stream, stream};
use log::{info, warn};
use mime_guess::MimeGuess;
use serde::{Deserialize, Serialize};
use tokio::{fs::File, signal};
use tokio_util::io::ReaderStream;
use trailer_dl::config::{Overrides, Settings, resolve_settings};
use trailer_dl::error::ServiceError;
use trailer_dl::process::ToolStatus;
use trailer_dl::progress::ProgressHub;
use trailer_dl::service::{DownloadReport, DownloadRequest, Downloader, VideoSummary};

/// Command-line flags. Anything left unset falls back to the environment,
/// then `.env`, then built-in defaults.
#[derive(Debug, Parser)]
#[command(name = "backend", about = "Local web front-end for yt-dlp downloads")]
struct BackendArgs {
    /// Directory downloads are written to (default: ~/Desktop/TRAILERS).
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// yt-dlp executable.
    #[arg(long = "yt-dlp")]
    ytdlp: Option<PathBuf>,
    /// ffmpeg executable used for merging.
    #[arg(long)]
    ffmpeg: Option<PathBuf>,
    /// Netscape cookie file passed to yt-dlp when it exists.
    #[arg(long)]
    cookies: Option<PathBuf>,
    /// Directory holding index.html and other static assets.
    #[arg(long)]
    www_root: Option<PathBuf>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    host: Option<String>,
    /// `global` sends every progress event to every listener; `session` keys
    /// them by the download's sessionId.
    #[arg(long)]
    progress_scope: Option<String>,
    /// Alternate dotenv file.
    #[arg(long)]
    env_file: Option<PathBuf>,
}

impl BackendArgs {
    fn into_overrides(self) -> Overrides {
        Overrides {
            output_dir: self.output_dir,
            ytdlp_path: self.ytdlp,
            ffmpeg_path: self.ffmpeg,
            cookies_path: self.cookies,
            www_root: self.www_root,
            port: self.port,
            host: self.host,
            progress_scope: self.progress_scope,
            env_path: self.env_file,
        }
    }
}

/// Shared state injected into every Axum handler.
#[derive(Clone)]
struct AppState {
    downloader: Arc<Downloader>,
    hub: Arc<ProgressHub>,
    www_root: Arc<PathBuf>,
}

impl AppState {
    fn new(settings: Settings) -> Self {
        let hub = Arc::new(ProgressHub::new(settings.progress_scope));
        let www_root = Arc::new(settings.www_root.clone());
        Self {
            downloader: Arc::new(Downloader::new(settings, hub.clone())),
            hub,
            www_root,
        }
    }
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
    details: Option<String>,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
            details: None,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let (status, details) = match &err {
            ServiceError::InvalidInput(_) => (StatusCode::BAD_REQUEST, None),
            ServiceError::NoSuitableFormat => (StatusCode::UNPROCESSABLE_ENTITY, None),
            other => (StatusCode::INTERNAL_SERVER_ERROR, Some(other.details())),
        };
        Self {
            status,
            message: err.to_string(),
            details,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => serde_json::json!({ "error": self.message, "details": details }),
            None => serde_json::json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Default, Deserialize)]
struct InfoRequest {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProgressQuery {
    session: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthReport {
    status: &'static str,
    ytdlp_binary: String,
    ffmpeg_binary: String,
    cookies: &'static str,
    trailers_folder: &'static str,
    progress_scope: &'static str,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = BackendArgs::parse();
    let settings = resolve_settings(args.into_overrides())?;
    let addr = SocketAddr::new(settings.host, settings.port);
    let state = AppState::new(settings);

    log_startup_checks(&state).await;

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {}", addr))?;
    info!("server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running HTTP server")?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/progress", get(progress))
        .route("/get-info", post(get_info))
        .route("/download", post(download))
        .route("/health", get(health))
        .fallback(static_fallback)
        .with_state(state)
}

async fn log_startup_checks(state: &AppState) {
    let settings = state.downloader.settings();
    info!("downloads go to {}", settings.output_dir.display());
    info!("progress scope: {}", state.hub.scope().as_str());

    match state.downloader.ytdlp_status().await {
        ToolStatus::Available(version) => info!("yt-dlp found ({version})"),
        other => {
            warn!(
                "yt-dlp not usable at {}: {other:?}",
                settings.ytdlp_path.display()
            );
            warn!("download it from https://github.com/yt-dlp/yt-dlp/releases/latest");
        }
    }
    if !state.downloader.ffmpeg_status().await.is_available() {
        warn!(
            "ffmpeg not usable at {}; merged downloads will fail",
            settings.ffmpeg_path.display()
        );
    }
    if state.downloader.cookies_present() {
        info!("{} found, sending cookies", settings.cookies_path.display());
    } else {
        warn!(
            "{} not found (optional, but helps with blocked formats)",
            settings.cookies_path.display()
        );
    }
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!("failed to install Ctrl+C handler: {}", err);
    }
}

async fn get_info(
    State(state): State<AppState>,
    payload: Result<Json<InfoRequest>, JsonRejection>,
) -> ApiResult<Json<VideoSummary>> {
    let payload = body_or_default(payload, "/get-info");
    let summary = state.downloader.fetch_info(payload.url.as_deref()).await?;
    Ok(Json(summary))
}

async fn download(
    State(state): State<AppState>,
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> ApiResult<Json<DownloadReport>> {
    let payload = body_or_default(payload, "/download");
    let report = state.downloader.download(&payload).await?;
    Ok(Json(report))
}

/// A body that is missing or not the expected JSON is treated like an empty
/// request, so the caller gets the usual `{error}` validation response.
fn body_or_default<T: Default>(payload: Result<Json<T>, JsonRejection>, route: &str) -> T {
    match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!("unreadable {route} body: {}", rejection.body_text());
            T::default()
        }
    }
}

/// Server-sent progress stream. The subscription is dropped, and therefore
/// unregistered, as soon as the client goes away.
async fn progress(
    State(state): State<AppState>,
    Query(query): Query<ProgressQuery>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let subscription = state.hub.subscribe(query.session);
    let events = stream::unfold(subscription, |mut subscription| async move {
        let event = subscription.recv().await?;
        Some((Event::default().json_data(&event), subscription))
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}

async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let downloader = &state.downloader;
    let ytdlp_binary = presence_label(downloader.ytdlp_status().await);
    let ffmpeg_binary = presence_label(downloader.ffmpeg_status().await);
    let cookies = if downloader.cookies_present() {
        "✅ Found"
    } else {
        "⚠️  Not found (optional)"
    };
    let trailers_folder = if downloader.settings().output_dir.is_dir() {
        "✅ Exists"
    } else {
        "✅ Will be created automatically"
    };

    Json(HealthReport {
        status: "ok",
        ytdlp_binary,
        ffmpeg_binary,
        cookies,
        trailers_folder,
        progress_scope: state.hub.scope().as_str(),
    })
}

fn presence_label(status: ToolStatus) -> String {
    match status {
        ToolStatus::Available(version) if version.is_empty() => "✅ Found".to_string(),
        ToolStatus::Available(version) => format!("✅ Found ({version})"),
        ToolStatus::Failed(code) => format!("❌ Broken (exit code {code})"),
        ToolStatus::Missing(_) => "❌ Missing".to_string(),
    }
}

async fn static_fallback(State(state): State<AppState>, req: Request<Body>) -> Response {
    match serve_www_path(&state.www_root, req.uri().path()).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn serve_www_path(root: &Path, request_path: &str) -> ApiResult<Response> {
    let target = resolve_www_path(root, request_path)?;
    match tokio::fs::metadata(&target).await {
        Ok(meta) if meta.is_dir() => stream_file(root.join("index.html")).await,
        Ok(_) => stream_file(target).await,
        Err(_) if should_fallback_to_index(request_path) => {
            stream_file(root.join("index.html")).await
        }
        Err(_) => Err(ApiError::not_found("file not found")),
    }
}

fn resolve_www_path(root: &Path, request_path: &str) -> ApiResult<PathBuf> {
    let trimmed = request_path.trim_start_matches('/');
    if trimmed.is_empty() {
        return Ok(root.join("index.html"));
    }
    let candidate = Path::new(trimmed);
    if candidate
        .components()
        .any(|component| !matches!(component, Component::Normal(_)))
    {
        return Err(ApiError::not_found("file not found"));
    }
    Ok(root.join(candidate))
}

/// Extension-less paths are client-side routes and get the UI itself.
fn should_fallback_to_index(request_path: &str) -> bool {
    let trimmed = request_path.trim_start_matches('/');
    trimmed.is_empty() || Path::new(trimmed).extension().is_none()
}

async fn stream_file(path: PathBuf) -> ApiResult<Response> {
    let file = File::open(&path)
        .await
        .map_err(|_| ApiError::not_found("file not found"))?;
    let mut headers = HeaderMap::new();
    if let Some(mime) = MimeGuess::from_path(&path).first()
        && let Ok(value) = HeaderValue::from_str(mime.as_ref())
    {
        headers.insert(header::CONTENT_TYPE, value);
    }
    let body = Body::from_stream(ReaderStream::new(file));
    Ok((headers, body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;
    use std::net::{IpAddr, Ipv4Addr};
    use tempfile::tempdir;
    use trailer_dl::progress::{ProgressEvent, ProgressScope};

    const FOUR_FORMATS: &str = r#"{
  "title": "Big Trailer",
  "thumbnail": "https://i.ytimg.com/vi/abc/maxresdefault.jpg",
  "duration": 142,
  "formats": [
    {"format_id": "sb0", "ext": "mhtml", "protocol": "mhtml", "vcodec": "none", "acodec": "none", "height": 180, "url": "https://s/sb0"},
    {"format_id": "140", "ext": "m4a", "protocol": "https", "vcodec": "none", "acodec": "mp4a.40.2", "filesize": 2883000, "format_note": "medium", "url": "https://s/140"},
    {"format_id": "137", "ext": "mp4", "protocol": "https", "vcodec": "avc1.640028", "acodec": "none", "width": 1920, "height": 1080, "fps": 25, "url": "https://s/137"},
    {"format_id": "247", "ext": "webm", "protocol": "https", "vcodec": "vp9", "acodec": "none", "width": 1280, "height": 720, "url": "https://s/247"},
    {"format_id": "22", "ext": "mp4", "protocol": "https", "vcodec": "avc1.64001F", "acodec": "mp4a.40.2", "width": 1280, "height": 720, "url": "https://s/22"},
    {"format_id": "135", "ext": "mp4", "protocol": "https", "vcodec": "avc1.4d401e", "acodec": "none", "width": 854, "height": 480, "url": "https://s/135"}
  ]
}"#;

    struct TestContext {
        _temp: tempfile::TempDir,
        base: PathBuf,
        state: AppState,
    }

    impl TestContext {
        fn new(download_body: &str) -> Self {
            Self::with_scope(download_body, ProgressScope::Global)
        }

        fn with_scope(download_body: &str, scope: ProgressScope) -> Self {
            let temp = tempdir().unwrap();
            let base = temp.path().to_path_buf();
            install_stub(
                &base,
                "yt-dlp",
                &format!(
                    "if [[ \"$1\" == \"--version\" ]]; then echo 2025.01.01; exit 0; fi\n\
                     if [[ \" $* \" == *\" --dump-single-json \"* ]]; then\n\
                     cat <<'JSON'\n{FOUR_FORMATS}\nJSON\nexit 0\nfi\n{download_body}"
                ),
            );
            install_stub(&base, "ffmpeg", "echo 'ffmpeg version 7.0'\n");
            std::fs::write(base.join("index.html"), "<html>trailers</html>").unwrap();

            let settings = Settings {
                output_dir: base.join("TRAILERS"),
                ytdlp_path: base.join("yt-dlp"),
                ffmpeg_path: base.join("ffmpeg"),
                cookies_path: base.join("cookies.txt"),
                www_root: base.clone(),
                port: 0,
                host: IpAddr::V4(Ipv4Addr::LOCALHOST),
                progress_scope: scope,
            };
            Self {
                _temp: temp,
                base,
                state: AppState::new(settings),
            }
        }
    }

    #[cfg(unix)]
    fn install_stub(dir: &Path, name: &str, body: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/usr/bin/env bash\n{body}")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
    }

    #[cfg(not(unix))]
    fn install_stub(_dir: &Path, _name: &str, _body: &str) {}

    async fn body_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn backend_args_map_to_overrides() {
        let args = BackendArgs::parse_from([
            "backend",
            "--port",
            "4242",
            "--yt-dlp",
            "/opt/yt-dlp",
            "--progress-scope",
            "session",
        ]);
        let overrides = args.into_overrides();
        assert_eq!(overrides.port, Some(4242));
        assert_eq!(overrides.ytdlp_path, Some(PathBuf::from("/opt/yt-dlp")));
        assert_eq!(overrides.progress_scope.as_deref(), Some("session"));
        assert!(overrides.host.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn get_info_returns_height_descending_formats() {
        let ctx = TestContext::new("exit 0\n");
        let Json(summary) = get_info(
            State(ctx.state.clone()),
            Ok(Json(InfoRequest {
                url: Some("https://valid".into()),
            })),
        )
        .await
        .unwrap();

        assert_eq!(summary.title.as_deref(), Some("Big Trailer"));
        let heights: Vec<i64> = summary.formats.iter().map(|f| f.height).collect();
        assert_eq!(heights, vec![1080, 720, 480]);
        assert_eq!(summary.formats[1].format_id, "22");
        assert!(summary.formats[1].compatible);

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["formats"][0]["formatId"], "137");
        assert_eq!(value["duration"], 142.0);
    }

    /// Sends one raw HTTP/1.1 request through the full router.
    async fn send_raw(app: Router, request: &str) -> (String, String, Value) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();

        let text = String::from_utf8(raw).unwrap();
        let (head, body) = text.split_once("\r\n\r\n").unwrap();
        let status_line = head.lines().next().unwrap().to_string();
        (status_line, head.to_ascii_lowercase(), serde_json::from_str(body).unwrap())
    }

    fn post(path: &str, content_type: Option<&str>, body: &str) -> String {
        let content_type = content_type
            .map(|value| format!("Content-Type: {value}\r\n"))
            .unwrap_or_default();
        format!(
            "POST {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n{content_type}Content-Length: {}\r\n\r\n{body}",
            body.len()
        )
    }

    #[tokio::test]
    async fn unreadable_bodies_get_json_errors() {
        let ctx = TestContext::new("exit 0\n");
        let app = router(ctx.state.clone());

        let (status, head, body) =
            send_raw(app.clone(), &post("/get-info", Some("application/json"), "{not json")).await;
        assert!(status.starts_with("HTTP/1.1 400"), "{status}");
        assert!(head.contains("content-type: application/json"));
        assert_eq!(body["error"], "Please provide a YouTube URL");

        let (status, _, body) =
            send_raw(app.clone(), &post("/get-info", Some("application/json"), r#"{"url": 5}"#)).await;
        assert!(status.starts_with("HTTP/1.1 400"), "{status}");
        assert_eq!(body["error"], "Please provide a YouTube URL");

        let (status, _, body) = send_raw(
            app,
            &post("/download", None, r#"{"url":"https://valid","formatId":"22"}"#),
        )
        .await;
        assert!(status.starts_with("HTTP/1.1 400"), "{status}");
        assert_eq!(body["error"], "Please provide both URL and format ID");
    }

    #[tokio::test]
    async fn get_info_without_url_is_bad_request() {
        let ctx = TestContext::new("exit 0\n");
        let err = get_info(State(ctx.state.clone()), Ok(Json(InfoRequest::default())))
            .await
            .unwrap_err();
        let (status, body) = body_json(err.into_response()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Please provide a YouTube URL");
        assert!(body.get("details").is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn download_reports_saved_location_and_streams_progress() {
        let ctx = TestContext::new(
            "echo '[download]  12.5% of 3.00MiB'\necho '[download] 100% of 3.00MiB'\nexit 0\n",
        );
        let mut listener = ctx.state.hub.subscribe(None);

        let Json(report) = download(
            State(ctx.state.clone()),
            Ok(Json(DownloadRequest {
                url: Some("https://valid".into()),
                format_id: Some("137".into()),
                session_id: None,
            })),
        )
        .await
        .unwrap();

        assert_eq!(report.format, "137+140");
        assert_eq!(report.saved_to, ctx.base.join("TRAILERS"));
        let value = serde_json::to_value(&report).unwrap();
        assert!(value["savedTo"].as_str().unwrap().ends_with("TRAILERS"));

        let events: Vec<ProgressEvent> = std::iter::from_fn(|| listener.try_recv()).collect();
        assert_eq!(
            events,
            vec![
                ProgressEvent::starting(),
                ProgressEvent::downloading(12.5),
                ProgressEvent::downloading(100.0),
                ProgressEvent::completed(),
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn download_failure_returns_message_and_details() {
        let ctx = TestContext::new("echo 'ERROR: HTTP Error 429: Too Many Requests' >&2\nexit 1\n");
        let err = download(
            State(ctx.state.clone()),
            Ok(Json(DownloadRequest {
                url: Some("https://valid".into()),
                format_id: Some("22".into()),
                session_id: None,
            })),
        )
        .await
        .unwrap_err();

        let (status, body) = body_json(err.into_response()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("Too many requests"));
        assert!(body["details"].as_str().unwrap().contains("HTTP Error 429"));
    }

    #[tokio::test]
    async fn download_without_format_is_bad_request() {
        let ctx = TestContext::new("exit 0\n");
        let err = download(
            State(ctx.state.clone()),
            Ok(Json(DownloadRequest {
                url: Some("https://valid".into()),
                format_id: None,
                session_id: None,
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn session_scoped_downloads_do_not_cross_talk() {
        let ctx = TestContext::with_scope("exit 0\n", ProgressScope::Session);
        let mut mine = ctx.state.hub.subscribe(Some("mine".into()));
        let mut theirs = ctx.state.hub.subscribe(Some("theirs".into()));

        download(
            State(ctx.state.clone()),
            Ok(Json(DownloadRequest {
                url: Some("https://valid".into()),
                format_id: Some("22".into()),
                session_id: Some("mine".into()),
            })),
        )
        .await
        .unwrap();

        assert_eq!(std::iter::from_fn(|| mine.try_recv()).count(), 2);
        assert!(theirs.try_recv().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn health_reports_binaries_and_cookies() {
        let ctx = TestContext::new("exit 0\n");
        let Json(report) = health(State(ctx.state.clone())).await;
        assert_eq!(report.status, "ok");
        assert_eq!(report.ytdlp_binary, "✅ Found (2025.01.01)");
        assert_eq!(report.ffmpeg_binary, "✅ Found (ffmpeg version 7.0)");
        assert_eq!(report.cookies, "⚠️  Not found (optional)");
        assert_eq!(report.trailers_folder, "✅ Will be created automatically");

        std::fs::write(ctx.base.join("cookies.txt"), "").unwrap();
        std::fs::remove_file(ctx.base.join("ffmpeg")).unwrap();
        let Json(report) = health(State(ctx.state.clone())).await;
        assert_eq!(report.cookies, "✅ Found");
        assert_eq!(report.ffmpeg_binary, "❌ Missing");
    }

    #[tokio::test]
    async fn progress_stream_unsubscribes_when_dropped() {
        let ctx = TestContext::new("exit 0\n");
        let sse = progress(State(ctx.state.clone()), Query(ProgressQuery::default())).await;
        assert_eq!(ctx.state.hub.subscriber_count(), 1);
        drop(sse);
        assert_eq!(ctx.state.hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn static_files_serve_index_and_reject_traversal() {
        let ctx = TestContext::new("exit 0\n");
        let root = ctx.state.www_root.clone();

        let response = serve_www_path(&root, "/").await.unwrap();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<html>trailers</html>");

        assert!(serve_www_path(&root, "/downloads/recent").await.is_ok());
        assert_eq!(
            serve_www_path(&root, "/../etc/passwd").await.unwrap_err().status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            serve_www_path(&root, "/missing.js").await.unwrap_err().status,
            StatusCode::NOT_FOUND
        );
    }
}
