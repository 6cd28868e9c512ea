use spectrum_core::{DEFAULT_FILL_FRACTION, DEFAULT_MARGIN_CSS, HitPolicyKind};
use std::env;
use std::time::Duration;

pub const DEFAULT_ORACLE_URL: &str = "http://127.0.0.1:8080/api";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: String },
    #[error("{name} must be in (0, 1], got {value}")]
    OutOfRange { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub oracle_url: String,
    pub request_timeout_ms: u64,
    pub leaderboard_poll_seconds: u64,
    pub countdown_tick_ms: u64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub device_pixel_ratio: f64,
    pub surface_fill_fraction: f64,
    pub surface_margin_px: f64,
    pub hit_policy: HitPolicyKind,
    pub selection_tolerance_px: f64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source. Unset variables take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = Self {
            oracle_url: lookup("ORACLE_URL").unwrap_or_else(|| DEFAULT_ORACLE_URL.to_string()),
            request_timeout_ms: parse_positive(&lookup, "REQUEST_TIMEOUT_MS", 10_000)?,
            leaderboard_poll_seconds: parse_positive(&lookup, "LEADERBOARD_POLL_SECONDS", 5)?,
            countdown_tick_ms: parse_positive(&lookup, "COUNTDOWN_TICK_MS", 100)?,
            viewport_width: parse_positive(&lookup, "VIEWPORT_WIDTH", 800.0)?,
            viewport_height: parse_positive(&lookup, "VIEWPORT_HEIGHT", 600.0)?,
            device_pixel_ratio: parse_positive(&lookup, "DEVICE_PIXEL_RATIO", 1.0)?,
            surface_fill_fraction: parse_fraction(
                &lookup,
                "SURFACE_FILL_FRACTION",
                DEFAULT_FILL_FRACTION,
            )?,
            surface_margin_px: parse_positive(&lookup, "SURFACE_MARGIN_PX", DEFAULT_MARGIN_CSS)?,
            hit_policy: parse(&lookup, "HIT_POLICY", HitPolicyKind::Authoritative)?,
            selection_tolerance_px: parse_positive(&lookup, "SELECTION_TOLERANCE_PX", 10.0)?,
        };
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn leaderboard_poll_interval(&self) -> Duration {
        Duration::from_secs(self.leaderboard_poll_seconds)
    }

    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            oracle_url: DEFAULT_ORACLE_URL.to_string(),
            request_timeout_ms: 10_000,
            leaderboard_poll_seconds: 5,
            countdown_tick_ms: 100,
            viewport_width: 800.0,
            viewport_height: 600.0,
            device_pixel_ratio: 1.0,
            surface_fill_fraction: DEFAULT_FILL_FRACTION,
            surface_margin_px: DEFAULT_MARGIN_CSS,
            hit_policy: HitPolicyKind::Authoritative,
            selection_tolerance_px: 10.0,
        }
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}

fn parse_positive<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default + ToString,
{
    let value = parse(lookup, name, default)?;
    if value > T::default() {
        Ok(value)
    } else {
        Err(ConfigError::NotPositive {
            name,
            value: value.to_string(),
        })
    }
}

fn parse_fraction(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: f64,
) -> Result<f64, ConfigError> {
    let value = parse(lookup, name, default)?;
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value: value.to_string(),
        })
    }
}
