#![forbid(unsafe_code)]

//! Error types shared by the process runner and the download service.

use crate::classify::FailureKind;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of one external-tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to read process output: {0}")]
    Io(#[from] io::Error),
    #[error("{}", exit_message(.code, .stderr))]
    Exited { code: i32, stderr: String },
}

impl ToolError {
    /// Text used for classification: stderr for exits, the OS error otherwise.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Exited { stderr, .. } if !stderr.trim().is_empty() => stderr.clone(),
            other => other.to_string(),
        }
    }
}

fn exit_message(code: &i32, stderr: &str) -> String {
    if stderr.trim().is_empty() {
        format!("process exited with code {code}")
    } else {
        stderr.to_string()
    }
}

/// Failures surfaced by [`crate::service::Downloader`].
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("{message}")]
    ExternalTool {
        kind: FailureKind,
        message: String,
        #[source]
        source: ToolError,
    },
    #[error("{}", FailureKind::MetadataFailed.user_message(None))]
    Parse(#[from] serde_json::Error),
    #[error("{}", FailureKind::NoVideoFormats.user_message(None))]
    NoSuitableFormat,
    #[error("{}", FailureKind::Muxer.user_message(None))]
    MuxerUnavailable { program: String, reason: String },
    #[error("could not prepare {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ServiceError {
    /// Raw diagnostics for the `details` field of error responses.
    pub fn details(&self) -> String {
        match self {
            Self::ExternalTool { source, .. } => source.diagnostic(),
            Self::Parse(err) => err.to_string(),
            Self::MuxerUnavailable { program, reason } => format!("{program}: {reason}"),
            Self::Storage { source, .. } => source.to_string(),
            Self::InvalidInput(message) => (*message).to_string(),
            Self::NoSuitableFormat => "no format passed the download filter".to_string(),
        }
    }
}
