#![forbid(unsafe_code)]

//! Async wrapper around external command-line tools (yt-dlp, ffmpeg).
//!
//! yt-dlp exposes no structured progress channel, so tracked runs scrape its
//! human-readable log for `[download] NN.N%` and `[Merger]` lines. Scraping is
//! best effort: a line that does not match simply produces no event.

use crate::error::ToolError;
use crate::progress::{ProgressEvent, ProgressPublisher};
use log::{debug, trace, warn};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

static DOWNLOAD_PERCENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[download\]\s+(\d+(?:\.\d+)?)%").expect("progress pattern is valid")
});

const MERGE_MARKER: &str = "[Merger]";
const READ_CHUNK: usize = 8 * 1024;

/// Extracts the progress event, if any, announced by one line of yt-dlp output.
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    if let Some(captures) = DOWNLOAD_PERCENT.captures(line)
        && let Ok(percent) = captures[1].parse::<f64>()
    {
        return Some(ProgressEvent::downloading(percent));
    }
    if line.contains(MERGE_MARKER) {
        return Some(ProgressEvent::merging());
    }
    None
}

/// Result of `<tool> --version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    Available(String),
    Failed(i32),
    Missing(String),
}

impl ToolStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// An external program invoked with plain argument vectors, never a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTool {
    program: PathBuf,
}

impl ExternalTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn label(&self) -> String {
        self.program.display().to_string()
    }

    /// Runs the tool to completion and returns its stdout.
    ///
    /// With a `progress` publisher the run is tracked: scraped progress lines
    /// are published as they arrive, followed by a `completed` event on exit
    /// code 0 or an `error` event carrying stderr otherwise.
    pub async fn run(
        &self,
        args: &[String],
        progress: Option<&ProgressPublisher>,
    ) -> Result<String, ToolError> {
        let result = self.run_inner(args, progress).await;
        if let Some(publisher) = progress {
            match &result {
                Ok(_) => publisher.publish(ProgressEvent::completed()),
                Err(err) => publisher.publish(ProgressEvent::error(err.diagnostic())),
            }
        }
        result
    }

    async fn run_inner(
        &self,
        args: &[String],
        progress: Option<&ProgressPublisher>,
    ) -> Result<String, ToolError> {
        debug!("running {} {:?}", self.label(), args);

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolError::Spawn {
                program: self.label(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ToolError::Io(std::io::Error::other("stdout was not captured")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ToolError::Io(std::io::Error::other("stderr was not captured")))?;

        // stderr is drained on its own task so a chatty tool never blocks on a
        // full pipe while we are busy with stdout.
        let stderr_task = tokio::spawn(read_to_string_lossy(stderr));
        let stdout_text = scan_stdout(stdout, progress).await?;

        let status = child.wait().await?;
        let stderr_text = match stderr_task.await {
            Ok(result) => result?,
            Err(err) => {
                warn!("stderr reader for {} panicked: {err}", self.label());
                String::new()
            }
        };
        for line in stderr_text.lines() {
            trace!("stderr: {line}");
        }

        let code = status.code().unwrap_or(-1);
        debug!("{} exited with code {code}", self.label());
        if status.success() {
            Ok(stdout_text)
        } else {
            Err(ToolError::Exited {
                code,
                stderr: stderr_text,
            })
        }
    }

    /// Runs `<tool> --version` to check whether the binary is usable.
    pub async fn probe(&self) -> ToolStatus {
        let output = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                let text = String::from_utf8_lossy(&output.stdout);
                let version = text.lines().next().unwrap_or_default().trim().to_string();
                ToolStatus::Available(version)
            }
            Ok(output) => ToolStatus::Failed(output.status.code().unwrap_or(-1)),
            Err(err) => ToolStatus::Missing(err.to_string()),
        }
    }
}

/// Accumulates stdout. Tracked runs also split it into `\n`/`\r` separated
/// lines, since yt-dlp redraws its progress bar with carriage returns.
/// Each byte is searched for separators once, so multi-megabyte single-line
/// JSON dumps stay linear.
async fn scan_stdout<R>(mut reader: R, progress: Option<&ProgressPublisher>) -> Result<String, ToolError>
where
    R: AsyncRead + Unpin,
{
    let mut output = String::new();
    let mut line_start = 0;
    let mut buffer = vec![0u8; READ_CHUNK];
    let mut undecoded = Vec::new();

    loop {
        let read = reader.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        undecoded.extend_from_slice(&buffer[..read]);
        let scan_from = output.len();
        let consumed = decode_utf8_prefix(&undecoded, &mut output);
        undecoded.drain(..consumed);

        if progress.is_some() {
            for (offset, _) in output[scan_from..].match_indices(['\n', '\r']) {
                let end = scan_from + offset;
                handle_line(&output[line_start..end], progress);
                line_start = end + 1;
            }
        }
    }

    if !undecoded.is_empty() {
        output.push_str(&String::from_utf8_lossy(&undecoded));
    }
    if progress.is_some() && line_start < output.len() {
        handle_line(&output[line_start..], progress);
    }
    Ok(output)
}

/// Appends the decodable prefix of `bytes` to `out`, replacing invalid
/// sequences with U+FFFD, and returns how many bytes were used. A sequence
/// truncated at the end of `bytes` is left for the next read.
fn decode_utf8_prefix(bytes: &[u8], out: &mut String) -> usize {
    let mut consumed = 0;
    loop {
        match std::str::from_utf8(&bytes[consumed..]) {
            Ok(text) => {
                out.push_str(text);
                return bytes.len();
            }
            Err(err) => {
                let valid = consumed + err.valid_up_to();
                out.push_str(std::str::from_utf8(&bytes[consumed..valid]).unwrap_or_default());
                match err.error_len() {
                    Some(len) => {
                        out.push(char::REPLACEMENT_CHARACTER);
                        consumed = valid + len;
                    }
                    None => return valid,
                }
            }
        }
    }
}

fn handle_line(line: &str, progress: Option<&ProgressPublisher>) {
    if line.is_empty() {
        return;
    }
    trace!("stdout: {line}");
    if let Some(publisher) = progress
        && let Some(event) = parse_progress_line(line)
    {
        publisher.publish(event);
    }
}

async fn read_to_string_lossy<R>(mut reader: R) -> Result<String, std::io::Error>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
