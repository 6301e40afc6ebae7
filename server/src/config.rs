use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::id::IdStrategy;

/// Command-line flags. Each one falls back to an environment variable
/// (populated by dotenvy before parsing) and then to a built-in default.
#[derive(Debug, Parser)]
#[command(name = "shrinkr", version, about = "Minimal URL shortener backed by a JSON file")]
pub struct Args {
    /// Address to bind the HTTP server to, as host:port
    #[arg(short = 'a', long, env = "SERVER_ADDRESS", default_value = "localhost:8080")]
    pub server_address: String,

    /// Base address prepended to generated ids to form short URLs
    #[arg(short = 'b', long, env = "BASE_URL", default_value = "http://localhost:8080/")]
    pub base_url: String,

    /// JSON file holding the id -> url table; empty keeps links in memory only
    #[arg(short = 'f', long, env = "FILE_STORAGE_PATH", default_value = "db.json")]
    pub file_storage_path: String,

    /// How identifiers are generated
    #[arg(long, env = "ID_STRATEGY", value_enum, default_value_t = IdStrategy::Hash)]
    pub id_strategy: IdStrategy,
}

/// Validated configuration, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// host:port the listener binds to
    pub server_address: String,

    /// Public base URL for short links, always ending in exactly one '/'
    pub base_url: String,

    /// `None` selects the non-persistent memory store
    pub file_storage_path: Option<PathBuf>,

    pub id_strategy: IdStrategy,
}

impl AppConfig {
    /// Parse the process arguments and environment.
    pub fn load() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    pub fn from_args(args: Args) -> Result<Self> {
        validate_address(&args.server_address)?;

        let file_storage_path = match args.file_storage_path.trim() {
            "" => None,
            path => Some(PathBuf::from(path)),
        };

        Ok(Self {
            server_address: args.server_address,
            base_url: normalize_base_url(&args.base_url)?,
            file_storage_path,
            id_strategy: args.id_strategy,
        })
    }
}

fn validate_address(addr: &str) -> Result<()> {
    let Some((host, port)) = addr.rsplit_once(':') else {
        bail!("SERVER_ADDRESS must be in the form host:port, got '{addr}'");
    };
    if host.is_empty() {
        bail!("SERVER_ADDRESS is missing a host, got '{addr}'");
    }
    port.parse::<u16>().with_context(|| {
        format!("SERVER_ADDRESS port must be a valid port number (1–65535), got '{port}'")
    })?;
    Ok(())
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed)
        .with_context(|| format!("BASE_URL must be an absolute URL, got '{raw}'"))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("BASE_URL must use http or https, got '{}'", parsed.scheme());
    }
    if parsed.host_str().is_none() {
        bail!("BASE_URL is missing a host, got '{raw}'");
    }

    Ok(format!("{trimmed}/"))
}
