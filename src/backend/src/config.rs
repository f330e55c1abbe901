use anyhow::{Context, Result, ensure};
use std::{env, sync::OnceLock, time::Duration};

/// Application configuration loaded and validated at startup
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Device service endpoints
    pub device: DeviceConfig,

    /// Upgrade page the flow is mounted as
    pub page: PageConfig,

    /// Start the system upgrade without asking when packages are pending
    pub auto_confirm: bool,
}

#[derive(Clone, Debug)]
pub struct DeviceConfig {
    /// Base the core's relative REST paths resolve against
    pub http_url: String,
    /// Base of the updater socket endpoint
    pub ws_url: String,
    pub request_timeout: Duration,
    /// Timeout of the probes made while the web portal restarts
    pub probe_timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct PageConfig {
    pub path: String,
    pub search: String,
}

impl AppConfig {
    /// Get or load the application configuration
    ///
    /// Returns a reference to the cached configuration. On first call, it loads
    /// and validates all configuration from environment variables.
    ///
    /// # Panics
    /// Panics if configuration loading fails, the shell cannot run without it.
    pub fn get() -> &'static Self {
        static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();
        APP_CONFIG.get_or_init(|| {
            Self::from_lookup(|key| env::var(key).ok())
                .expect("failed to load application configuration")
        })
    }

    /// Load the configuration from `lookup`, applying defaults for missing keys
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let device = DeviceConfig::load(&lookup)?;
        let page = PageConfig::load(&lookup)?;
        let auto_confirm = parse_flag(&lookup, "AUTO_CONFIRM")?;

        Ok(Self {
            device,
            page,
            auto_confirm,
        })
    }
}

impl DeviceConfig {
    fn load(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let http_url = lookup("DEVICE_URL").unwrap_or_else(|| "http://127.0.0.1".to_string());
        ensure!(
            http_url.starts_with("http://") || http_url.starts_with("https://"),
            "failed to parse DEVICE_URL: expected http(s) url, got {http_url}"
        );

        let ws_url = lookup("WS_URL").unwrap_or_else(|| "ws://127.0.0.1".to_string());
        ensure!(
            ws_url.starts_with("ws://") || ws_url.starts_with("wss://"),
            "failed to parse WS_URL: expected ws(s) url, got {ws_url}"
        );

        Ok(Self {
            http_url: http_url.trim_end_matches('/').to_string(),
            ws_url: ws_url.trim_end_matches('/').to_string(),
            request_timeout: parse_millis(lookup, "REQUEST_TIMEOUT_MS", 10_000)?,
            probe_timeout: parse_millis(lookup, "PROBE_TIMEOUT_MS", 2_000)?,
        })
    }
}

impl PageConfig {
    fn load(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let path = lookup("PAGE_PATH").unwrap_or_else(|| "/onboarding/upgrade".to_string());
        ensure!(
            path.starts_with('/') && !path.contains('?'),
            "failed to parse PAGE_PATH: expected absolute path without query, got {path}"
        );

        let search = lookup("PAGE_SEARCH").unwrap_or_default();
        ensure!(
            search.is_empty() || search.starts_with('?'),
            "failed to parse PAGE_SEARCH: expected empty or leading '?', got {search}"
        );

        Ok(Self { path, search })
    }
}

fn parse_millis(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<Duration> {
    let millis = match lookup(key) {
        Some(value) => value
            .parse::<u64>()
            .with_context(|| format!("failed to parse {key}: invalid format"))?,
        None => default,
    };
    ensure!(millis > 0, "failed to parse {key}: must be positive");

    Ok(Duration::from_millis(millis))
}

fn parse_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<bool> {
    match lookup(key).as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("") | Some("0") | Some("false") => Ok(false),
        Some("1") | Some("true") => Ok(true),
        Some(other) => anyhow::bail!("failed to parse {key}: expected true or false, got {other}"),
    }
}
