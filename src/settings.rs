// src/settings.rs

use once_cell::sync::Lazy;
use std::path::PathBuf;
use url::Url;

/// Host every probe is aimed at unless overridden.
pub const DEFAULT_TARGET: &str = "geoip.maxmind.com";

/// Archive written into the working directory unless overridden.
pub const DEFAULT_ARCHIVE: &str = "mm-network-analysis.zip";

pub const TARGET_ENV: &str = "NETWORK_ANALYZER_TARGET";
pub const ARCHIVE_ENV: &str = "NETWORK_ANALYZER_ARCHIVE";

// Same identity curl and the HTTP probe present to the server.
static USER_AGENT: Lazy<String> = Lazy::new(|| {
    std::env::args()
        .next()
        .filter(|arg| !arg.is_empty())
        .unwrap_or_else(|| format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")))
});

/// Everything a run needs to know up front. Fixed for the life of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub target: String,
    pub archive_path: PathBuf,
    pub user_agent: String,
    /// Utility whose `--help` output decides how the route reports are rendered.
    pub mtr_program: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            archive_path: PathBuf::from(DEFAULT_ARCHIVE),
            user_agent: USER_AGENT.clone(),
            mtr_program: "mtr".to_string(),
        }
    }
}

impl Settings {
    /// Defaults, with the target and archive path optionally taken from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        if let Some(target) = lookup(TARGET_ENV).filter(|v| !v.trim().is_empty()) {
            settings.target = normalize_target(target.trim());
        }
        if let Some(archive) = lookup(ARCHIVE_ENV).filter(|v| !v.trim().is_empty()) {
            settings.archive_path = PathBuf::from(archive);
        }
        settings
    }
}

/// Accepts either a bare host or a URL and returns just the host.
pub fn normalize_target(raw: &str) -> String {
    let with_scheme = if !raw.starts_with("http://") && !raw.starts_with("https://") {
        format!("https://{}", raw)
    } else {
        raw.to_string()
    };
    Url::parse(&with_scheme)
        .ok()
        .and_then(|url| url.host_str().map(String::from))
        .unwrap_or_else(|| raw.to_string())
}
