//! Gate configuration: risk policy and environment loading.
//!
//! The configuration is built once at process start and shared read-only
//! across requests (`Arc<GateConfig>`); nothing here is mutated afterwards.

use std::fmt;
use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

use mietrecht_auth::ValidationConfig;

/// A named, weighted input to the risk score.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskFactor {
    pub name: &'static str,
    /// Weight in [0, 1]. Weights of different factors need not sum to 1.
    pub weight: f64,
}

impl RiskFactor {
    pub const USER_BEHAVIOR: &'static str = "user_behavior";
    pub const TIME_BASED: &'static str = "time_based";

    /// Weight `score` by this factor.
    #[must_use]
    pub fn apply(&self, score: f64) -> f64 {
        score * self.weight
    }
}

/// One row of the hour-of-day table.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeBand {
    pub hours: RangeInclusive<u32>,
    pub score: f64,
}

/// Tunable risk policy.
///
/// The defaults are hand-picked policy values, not derived results.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskPolicy {
    pub user_behavior: RiskFactor,
    pub time_based: RiskFactor,
    /// Scores strictly above this are denied.
    pub deny_above: f64,
    /// Scores strictly above this (and not denied) are allowed with a warning.
    pub warn_above: f64,
    /// Behavior score for a principal the identity store does not know.
    pub unknown_identity_score: f64,
    /// Behavior score when the identity store errors or times out.
    pub lookup_failure_score: f64,
    /// Anomaly added for access during `late_night_hours`.
    pub late_night_anomaly_score: f64,
    pub late_night_hours: RangeInclusive<u32>,
    /// Evaluated in order, first match wins.
    pub time_bands: Vec<TimeBand>,
    /// Time score for hours no band covers.
    pub off_hours_score: f64,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            user_behavior: RiskFactor {
                name: RiskFactor::USER_BEHAVIOR,
                weight: 0.5,
            },
            time_based: RiskFactor {
                name: RiskFactor::TIME_BASED,
                weight: 0.5,
            },
            deny_above: 80.0,
            warn_above: 50.0,
            unknown_identity_score: 90.0,
            lookup_failure_score: 50.0,
            late_night_anomaly_score: 20.0,
            late_night_hours: 2..=5,
            time_bands: vec![
                // night
                TimeBand {
                    hours: 2..=5,
                    score: 40.0,
                },
                // early morning
                TimeBand {
                    hours: 6..=8,
                    score: 20.0,
                },
                // business hours
                TimeBand {
                    hours: 9..=17,
                    score: 10.0,
                },
            ],
            off_hours_score: 25.0,
        }
    }
}

/// Complete gate configuration.
#[derive(Clone)]
pub struct GateConfig {
    /// Listen address of the HTTP service embedding the gate.
    pub listen_addr: SocketAddr,

    /// Shared HS256 secret used to verify bearer tokens.
    pub jwt_secret: String,

    /// Expected token issuer, if any.
    pub jwt_issuer: Option<String>,

    /// Clock skew tolerance for `exp`, in seconds.
    pub jwt_leeway_secs: u64,

    /// Upper bound on a single identity lookup.
    pub lookup_timeout: Duration,

    /// TTL of cached identity profiles. Zero disables the cache.
    pub identity_cache_ttl_secs: u64,

    /// Take the network address from `X-Forwarded-For` instead of the peer.
    /// Only enable behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,

    /// Header carrying the caller-supplied device id.
    pub device_id_header: String,

    /// Header carrying the caller-supplied location.
    pub location_header: String,

    /// Optional JSON file of identity profiles to seed the in-memory store.
    pub identity_store_path: Option<PathBuf>,

    /// Paths that bypass the gate (exact, or prefix when ending in `*`).
    pub public_paths: Vec<String>,

    pub policy: RiskPolicy,
}

impl fmt::Debug for GateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateConfig")
            .field("listen_addr", &self.listen_addr)
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwt_leeway_secs", &self.jwt_leeway_secs)
            .field("lookup_timeout", &self.lookup_timeout)
            .field("identity_cache_ttl_secs", &self.identity_cache_ttl_secs)
            .field("trust_forwarded_for", &self.trust_forwarded_for)
            .field("device_id_header", &self.device_id_header)
            .field("location_header", &self.location_header)
            .field("identity_store_path", &self.identity_store_path)
            .field("public_paths", &self.public_paths)
            .field("policy", &self.policy)
            .finish()
    }
}

impl GateConfig {
    /// Configuration with defaults and the given signing secret.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: jwt_secret.into(),
            jwt_issuer: None,
            jwt_leeway_secs: 0,
            lookup_timeout: Duration::from_millis(300),
            identity_cache_ttl_secs: 60,
            trust_forwarded_for: false,
            device_id_header: "x-device-id".to_string(),
            location_header: "x-location".to_string(),
            identity_store_path: None,
            public_paths: vec!["/health".to_string()],
            policy: RiskPolicy::default(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// This allows tests to supply variables without mutating process-global
    /// environment state.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let jwt_secret =
            reader("JWT_SECRET").map_err(|_| ConfigError::MissingVar("JWT_SECRET".into()))?;
        if jwt_secret.is_empty() {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET".into(),
                "must not be empty".into(),
            ));
        }

        let mut config = Self::new(jwt_secret);

        if let Ok(addr) = reader("ACCESS_GATE_LISTEN_ADDR") {
            config.listen_addr = addr.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("ACCESS_GATE_LISTEN_ADDR".into(), e.to_string())
            })?;
        }

        config.jwt_issuer = reader("JWT_ISSUER").ok().filter(|s| !s.is_empty());
        config.jwt_leeway_secs = parse_or(&reader, "JWT_LEEWAY_SECS", config.jwt_leeway_secs)?;
        config.lookup_timeout = Duration::from_millis(parse_or(
            &reader,
            "IDENTITY_LOOKUP_TIMEOUT_MS",
            300u64,
        )?);
        config.identity_cache_ttl_secs =
            parse_or(&reader, "IDENTITY_CACHE_TTL_SECS", config.identity_cache_ttl_secs)?;
        config.trust_forwarded_for = parse_or(&reader, "TRUST_FORWARDED_FOR", false)?;

        if let Ok(header) = reader("DEVICE_ID_HEADER") {
            config.device_id_header = header.to_ascii_lowercase();
        }
        if let Ok(header) = reader("LOCATION_HEADER") {
            config.location_header = header.to_ascii_lowercase();
        }

        config.identity_store_path = reader("IDENTITY_STORE_PATH").ok().map(PathBuf::from);

        if let Ok(paths) = reader("PUBLIC_PATHS") {
            config.public_paths = paths
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }

        config.policy.user_behavior.weight = parse_weight(&reader, "RISK_WEIGHT_USER_BEHAVIOR")?
            .unwrap_or(config.policy.user_behavior.weight);
        config.policy.time_based.weight = parse_weight(&reader, "RISK_WEIGHT_TIME_BASED")?
            .unwrap_or(config.policy.time_based.weight);
        config.policy.deny_above = parse_threshold(&reader, "RISK_DENY_THRESHOLD")?
            .unwrap_or(config.policy.deny_above);
        config.policy.warn_above = parse_threshold(&reader, "RISK_WARN_THRESHOLD")?
            .unwrap_or(config.policy.warn_above);

        if config.policy.warn_above > config.policy.deny_above {
            return Err(ConfigError::InvalidValue(
                "RISK_WARN_THRESHOLD".into(),
                format!(
                    "{} is above RISK_DENY_THRESHOLD {}",
                    config.policy.warn_above, config.policy.deny_above
                ),
            ));
        }

        Ok(config)
    }

    /// Token validation settings derived from this configuration.
    #[must_use]
    pub fn validation(&self) -> ValidationConfig {
        let validation = ValidationConfig::with_leeway(self.jwt_leeway_secs);
        match &self.jwt_issuer {
            Some(iss) => validation.issuer(iss.clone()),
            None => validation,
        }
    }

    /// Check if a path is public (no gate).
    #[must_use]
    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_paths.iter().any(|public_path| {
            match public_path.strip_suffix('*') {
                Some(prefix) => path.starts_with(prefix),
                None => path == public_path,
            }
        })
    }
}

fn parse_or<F, T>(reader: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match reader(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.into(), e.to_string())),
        Err(_) => Ok(default),
    }
}

fn parse_weight<F>(reader: &F, key: &str) -> Result<Option<f64>, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let Ok(value) = reader(key) else {
        return Ok(None);
    };
    let weight = value
        .trim()
        .parse::<f64>()
        .map_err(|e| ConfigError::InvalidValue(key.into(), e.to_string()))?;
    if !(0.0..=1.0).contains(&weight) {
        return Err(ConfigError::InvalidValue(
            key.into(),
            format!("{weight} is outside [0, 1]"),
        ));
    }
    Ok(Some(weight))
}

/// Thresholds must be finite scores in [0, 100].
fn parse_threshold<F>(reader: &F, key: &str) -> Result<Option<f64>, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let Ok(value) = reader(key) else {
        return Ok(None);
    };
    let threshold = value
        .trim()
        .parse::<f64>()
        .map_err(|e| ConfigError::InvalidValue(key.into(), e.to_string()))?;
    if !threshold.is_finite() || !(0.0..=100.0).contains(&threshold) {
        return Err(ConfigError::InvalidValue(
            key.into(),
            format!("{threshold} is outside [0, 100]"),
        ));
    }
    Ok(Some(threshold))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}
