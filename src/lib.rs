#![forbid(unsafe_code)]

//! Local front-end for yt-dlp: format ranking, progress scraping and the
//! download orchestration used by the `backend` binary.

pub mod classify;
pub mod config;
pub mod error;
pub mod formats;
pub mod process;
pub mod progress;
pub mod service;
