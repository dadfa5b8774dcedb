use std::time::Duration;

use bridge_solver::api::{ExecutionTier, TierLimits};

/// Service settings read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Analyses allowed to run at once
    pub workers: usize,
    /// Most capable tier this deployment accepts
    pub plan: ExecutionTier,
    pub tier_limits: TierLimits,
    /// How long a finished job stays queryable
    pub retention: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8087,
            workers: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            plan: ExecutionTier::Unbounded,
            tier_limits: TierLimits::default(),
            retention: Duration::from_secs(3600),
        }
    }
}

impl ServiceConfig {
    /// HOST, PORT, RATING_WORKERS, RATING_PLAN, RATING_MAX_SPANS and
    /// RATING_RETENTION_SECS.
    /// Unparseable values fall back to the defaults with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = parsed(&lookup, "PORT") {
            config.port = port;
        }
        if let Some(workers) = parsed::<usize>(&lookup, "RATING_WORKERS") {
            config.workers = workers.max(1);
        }
        if let Some(plan) = parsed(&lookup, "RATING_PLAN") {
            config.plan = plan;
        }
        if let Some(spans) = parsed(&lookup, "RATING_MAX_SPANS") {
            config.tier_limits.max_spans = spans;
        }
        if let Some(secs) = parsed(&lookup, "RATING_RETENTION_SECS") {
            config.retention = Duration::from_secs(secs);
        }
        config
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ServiceConfig {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.addr(), "0.0.0.0:8087");
        assert_eq!(config.plan, ExecutionTier::Unbounded);
        assert_eq!(config.tier_limits, TierLimits::default());
        assert!(config.workers >= 1);
        assert_eq!(config.retention, Duration::from_secs(3600));
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("RATING_WORKERS", "0"),
            ("RATING_PLAN", "Bounded"),
            ("RATING_MAX_SPANS", "5"),
            ("RATING_RETENTION_SECS", "0"),
        ]);
        assert_eq!(config.addr(), "127.0.0.1:9000");
        assert_eq!(config.workers, 1);
        assert_eq!(config.plan, ExecutionTier::Bounded);
        assert_eq!(config.tier_limits.max_spans, 5);
        assert_eq!(config.retention, Duration::ZERO);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = config(&[
            ("PORT", "eighty"),
            ("RATING_PLAN", "premium"),
            ("RATING_RETENTION_SECS", "-1"),
        ]);
        assert_eq!(config.port, 8087);
        assert_eq!(config.retention, Duration::from_secs(3600));
        assert_eq!(config.plan, ExecutionTier::Unbounded);
    }
}
