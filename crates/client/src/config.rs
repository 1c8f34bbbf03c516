use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_BIND: &str = "127.0.0.1:7878";

/// Pacing between staged UI transitions. None of these are correctness-bearing waits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    /// Offset between consecutive actions of one run.
    pub stagger: Duration,
    /// Time a freshly shown panel gets before its data is requested.
    pub mount_delay: Duration,
    /// Upper bound on waiting for fresh catalog data before seeding the editor.
    pub editor_settle: Duration,
    /// Gap between closing the library and showing the editor.
    pub editor_open_delay: Duration,
    pub trim_notice: Duration,
    pub merge_notice: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            stagger: Duration::from_millis(100),
            mount_delay: Duration::from_millis(200),
            editor_settle: Duration::from_millis(800),
            editor_open_delay: Duration::from_millis(300),
            trim_notice: Duration::from_millis(3000),
            merge_notice: Duration::from_millis(5000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the generation and transcode service. Asset urls are relative to it.
    pub api_base_url: String,
    pub bind_addr: SocketAddr,
    pub request_timeout: Duration,
    pub timing: Timing,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: DEFAULT_API_URL.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 7878)),
            request_timeout: Duration::from_secs(300),
            timing: Timing::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Timing::default();
        let millis = |key: &str, default: Duration| -> Result<Duration> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_millis)
                    .with_context(|| format!("{} must be a whole number of milliseconds", key)),
                None => Ok(default),
            }
        };

        let api_base_url = lookup("VIDCRAFT_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let bind_addr = lookup("VIDCRAFT_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse::<SocketAddr>()
            .context("VIDCRAFT_BIND must be a socket address like 127.0.0.1:7878")?;
        let request_timeout = match lookup("VIDCRAFT_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.trim()
                    .parse::<u64>()
                    .context("VIDCRAFT_REQUEST_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            None => Duration::from_secs(300),
        };

        Ok(Config {
            api_base_url,
            bind_addr,
            request_timeout,
            timing: Timing {
                stagger: millis("VIDCRAFT_STAGGER_MS", defaults.stagger)?,
                mount_delay: millis("VIDCRAFT_MOUNT_DELAY_MS", defaults.mount_delay)?,
                editor_settle: millis("VIDCRAFT_EDITOR_SETTLE_MS", defaults.editor_settle)?,
                editor_open_delay: millis("VIDCRAFT_EDITOR_OPEN_MS", defaults.editor_open_delay)?,
                trim_notice: millis("VIDCRAFT_TRIM_NOTICE_MS", defaults.trim_notice)?,
                merge_notice: millis("VIDCRAFT_MERGE_NOTICE_MS", defaults.merge_notice)?,
            },
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    /// Absolute media url. Relative asset urls (`/videos/x.mp4`) are resolved against the
    /// service; absolute ones pass through.
    pub fn media_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            self.endpoint(url)
        }
    }

    /// Media url with a cache-busting query so the player reloads trimmed content.
    pub fn player_url(&self, url: &str, cache_key: i64) -> String {
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{}{}t={}", self.media_url(url), separator, cache_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_timings() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:5000");
        assert_eq!(config.timing, Timing::default());
        assert_eq!(config.timing.stagger, Duration::from_millis(100));
    }

    #[test]
    fn overrides_are_read_and_base_url_normalised() {
        let config = Config::from_lookup(lookup(&[
            ("VIDCRAFT_API_URL", "http://media:9000/"),
            ("VIDCRAFT_STAGGER_MS", "5"),
            ("VIDCRAFT_BIND", "0.0.0.0:8080"),
        ]))
        .unwrap();
        assert_eq!(config.endpoint("/videos"), "http://media:9000/videos");
        assert_eq!(config.timing.stagger, Duration::from_millis(5));
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn invalid_numbers_name_the_variable() {
        let err = Config::from_lookup(lookup(&[("VIDCRAFT_MOUNT_DELAY_MS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("VIDCRAFT_MOUNT_DELAY_MS"));
    }

    #[test]
    fn player_urls_are_cache_busted() {
        let config = Config::default();
        assert_eq!(
            config.player_url("/videos/a.mp4", 42),
            "http://localhost:5000/videos/a.mp4?t=42"
        );
        assert_eq!(
            config.player_url("https://cdn/x.mp4?sig=1", 7),
            "https://cdn/x.mp4?sig=1&t=7"
        );
    }
}
