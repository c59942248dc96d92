#![forbid(unsafe_code)]

use crate::progress::ProgressScope;
use anyhow::{Context, Result, anyhow};
use std::{
    collections::HashMap,
    env, fs,
    net::IpAddr,
    path::{Path, PathBuf},
};

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_YTDLP: &str = "yt-dlp";
pub const DEFAULT_FFMPEG: &str = "ffmpeg";
pub const DEFAULT_COOKIES_FILE: &str = "cookies.txt";
pub const DEFAULT_WWW_ROOT: &str = ".";
const TRAILERS_SUBDIR: &str = "TRAILERS";

/// Fully resolved settings for one server run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub ytdlp_path: PathBuf,
    pub ffmpeg_path: PathBuf,
    pub cookies_path: PathBuf,
    pub www_root: PathBuf,
    pub port: u16,
    pub host: IpAddr,
    pub progress_scope: ProgressScope,
}

impl Settings {
    /// True when ffmpeg is not the one yt-dlp would find by itself.
    pub fn has_custom_ffmpeg(&self) -> bool {
        self.ffmpeg_path != Path::new(DEFAULT_FFMPEG)
    }
}

/// Values given on the command line; they beat the environment and `.env`.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub output_dir: Option<PathBuf>,
    pub ytdlp_path: Option<PathBuf>,
    pub ffmpeg_path: Option<PathBuf>,
    pub cookies_path: Option<PathBuf>,
    pub www_root: Option<PathBuf>,
    pub port: Option<u16>,
    pub host: Option<String>,
    pub progress_scope: Option<String>,
    pub env_path: Option<PathBuf>,
}

pub fn resolve_settings(overrides: Overrides) -> Result<Settings> {
    let env_path = overrides
        .env_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(&env_path)?;
    build_settings(&file_vars, env_var_string, overrides)
}

fn build_settings(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: Overrides,
) -> Result<Settings> {
    let path_setting = |value: Option<PathBuf>, key: &str| -> Option<PathBuf> {
        value.or_else(|| lookup_value(key, file_vars, &env_lookup).map(PathBuf::from))
    };

    let output_dir = match path_setting(overrides.output_dir, "TRAILERS_DIR") {
        Some(path) => path,
        None => default_output_dir()?,
    };
    let ytdlp_path = path_setting(overrides.ytdlp_path, "TRAILERS_YTDLP")
        .unwrap_or_else(|| PathBuf::from(DEFAULT_YTDLP));
    let ffmpeg_path = path_setting(overrides.ffmpeg_path, "TRAILERS_FFMPEG")
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FFMPEG));
    let cookies_path = path_setting(overrides.cookies_path, "TRAILERS_COOKIES")
        .unwrap_or_else(|| PathBuf::from(DEFAULT_COOKIES_FILE));
    let www_root = path_setting(overrides.www_root, "TRAILERS_WWW_ROOT")
        .unwrap_or_else(|| PathBuf::from(DEFAULT_WWW_ROOT));

    let port = overrides
        .port
        .or_else(|| {
            lookup_value("TRAILERS_PORT", file_vars, &env_lookup).and_then(|value| value.parse().ok())
        })
        .unwrap_or(DEFAULT_PORT);

    let host_raw = overrides
        .host
        .filter(|value| !value.trim().is_empty())
        .or_else(|| lookup_value("TRAILERS_HOST", file_vars, &env_lookup))
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let host = host_raw
        .trim()
        .parse::<IpAddr>()
        .with_context(|| format!("expected a valid IPv4 or IPv6 address for TRAILERS_HOST, got {host_raw}"))?;

    let progress_scope = match overrides
        .progress_scope
        .or_else(|| lookup_value("TRAILERS_PROGRESS_SCOPE", file_vars, &env_lookup))
    {
        Some(raw) => ProgressScope::parse(&raw)
            .ok_or_else(|| anyhow!("TRAILERS_PROGRESS_SCOPE must be `global` or `session`, got {raw}"))?,
        None => ProgressScope::default(),
    };

    Ok(Settings {
        output_dir,
        ytdlp_path,
        ffmpeg_path,
        cookies_path,
        www_root,
        port,
        host,
        progress_scope,
    })
}

/// `~/Desktop/TRAILERS`, where downloads land unless configured otherwise.
pub fn default_output_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("could not determine home directory"))?;
    Ok(home.join("Desktop").join(TRAILERS_SUBDIR))
}

fn env_var_string(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn lookup_value(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env_lookup(key)
        .or_else(|| file_vars.get(key).cloned())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parses a dotenv-style file. A missing file yields no variables.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    if !path.exists() {
        return Ok(vars);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        vars.insert(key.to_string(), unquote(value.trim()).to_string());
    }
    Ok(vars)
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|quote| {
            value
                .strip_prefix(*quote)
                .and_then(|inner| inner.strip_suffix(*quote))
        })
        .unwrap_or(value)
}
