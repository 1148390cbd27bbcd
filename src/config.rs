//! Environment-shaped configuration loader.
//!
//! Generalizes the file-or-default loading shape of the teacher's
//! `config::load_config` to env-var-or-default, with validation errors that
//! name the offending variable.

use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },

    #[error("unsupported transport {0:?}: only \"http\" is supported, stdio is deprecated")]
    DeprecatedTransport(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub http_host: String,
    pub http_port: u16,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,

    pub enable_coordination_engine: bool,
    pub coordination_engine_url: Option<String>,

    pub enable_prometheus: bool,
    pub prometheus_url: Option<String>,

    pub enable_kserve: bool,
    pub kserve_namespace: Option<String>,
    pub kserve_predictor_port: u16,

    pub anomaly_threshold: f64,
    pub kubeconfig: Option<String>,

    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl GatewayConfig {
    /// Loads configuration from the environment, applying the defaults from
    /// the external interfaces contract. Validation errors name the
    /// offending variable so startup failures are actionable.
    pub fn from_env() -> Result<Self> {
        if let Ok(transport) = env::var("TRANSPORT")
            && transport != "http"
        {
            return Err(ConfigError::DeprecatedTransport(transport));
        }

        let http_host = env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let http_port = parse_env_or("HTTP_PORT", "HTTP_PORT", 8080u16)?;

        let cache_ttl = parse_duration_env_or("CACHE_TTL", Duration::from_secs(30))?;
        let request_timeout = parse_duration_env_or("REQUEST_TIMEOUT", Duration::from_secs(30))?;

        let enable_coordination_engine = parse_bool_env("ENABLE_COORDINATION_ENGINE");
        let coordination_engine_url = env::var("COORDINATION_ENGINE_URL").ok();

        let enable_prometheus = parse_bool_env("ENABLE_PROMETHEUS");
        let prometheus_url = env::var("PROMETHEUS_URL").ok();

        let enable_kserve = parse_bool_env("ENABLE_KSERVE");
        let kserve_namespace = env::var("KSERVE_NAMESPACE").ok();
        let kserve_predictor_port = parse_env_or("KSERVE_PREDICTOR_PORT", "KSERVE_PREDICTOR_PORT", 8080u16)?;

        let anomaly_threshold = parse_env_or("ANOMALY_THRESHOLD", "ANOMALY_THRESHOLD", 0.3f64)?;
        if !(0.0..=1.0).contains(&anomaly_threshold) {
            return Err(ConfigError::Invalid {
                var: "ANOMALY_THRESHOLD",
                message: "must be within [0, 1]".to_string(),
            });
        }

        let kubeconfig = env::var("KUBECONFIG").ok();

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(GatewayConfig {
            http_host,
            http_port,
            cache_ttl,
            request_timeout,
            enable_coordination_engine,
            coordination_engine_url,
            enable_prometheus,
            prometheus_url,
            enable_kserve,
            kserve_namespace,
            kserve_predictor_port,
            anomaly_threshold,
            kubeconfig,
            log_format,
        })
    }
}

fn parse_bool_env(var: &str) -> bool {
    matches!(
        env::var(var).as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE") | Ok("True")
    )
}

fn parse_env_or<T: std::str::FromStr>(var: &str, name: &'static str, default: T) -> Result<T> {
    match env::var(var) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            var: name,
            message: format!("could not parse {:?}", raw),
        }),
        Err(_) => Ok(default),
    }
}

fn parse_duration_env_or(var: &'static str, default: Duration) -> Result<Duration> {
    match env::var(var) {
        Ok(raw) => {
            let secs: u64 = raw.trim_end_matches('s').parse().map_err(|_| ConfigError::Invalid {
                var,
                message: format!("could not parse duration {:?}", raw),
            })?;
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_apply_with_no_env_set() {
        let _guard = ENV_LOCK.lock().unwrap();
        for var in [
            "TRANSPORT",
            "HTTP_HOST",
            "HTTP_PORT",
            "CACHE_TTL",
            "REQUEST_TIMEOUT",
            "ANOMALY_THRESHOLD",
        ] {
            unsafe { env::remove_var(var) };
        }
        let config = GatewayConfig::from_env().unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.cache_ttl, Duration::from_secs(30));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!((config.anomaly_threshold - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn deprecated_stdio_transport_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe { env::set_var("TRANSPORT", "stdio") };
        let result = GatewayConfig::from_env();
        unsafe { env::remove_var("TRANSPORT") };
        assert!(matches!(result, Err(ConfigError::DeprecatedTransport(_))));
    }

    #[test]
    fn out_of_range_anomaly_threshold_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe { env::set_var("ANOMALY_THRESHOLD", "1.5") };
        let result = GatewayConfig::from_env();
        unsafe { env::remove_var("ANOMALY_THRESHOLD") };
        assert!(result.is_err());
    }
}
