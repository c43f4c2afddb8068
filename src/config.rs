//! Dispatch configuration.

use serde::{Deserialize, Serialize};

use crate::error::{CourierResult, ValidationError};

/// Environment variable overriding [`DispatchConfig::workers`].
pub const ENV_WORKERS: &str = "COURIER_WORKERS";
/// Environment variable overriding [`DispatchConfig::queue_capacity`]; `0` means unbounded.
pub const ENV_QUEUE_CAPACITY: &str = "COURIER_QUEUE_CAPACITY";

/// Delivery pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Number of delivery worker threads.
    pub workers: usize,
    /// Max queued deliveries. `None` never drops and never blocks the producer;
    /// `Some(n)` drops (and counts) deliveries that do not fit.
    pub queue_capacity: Option<usize>,
    /// Prefix for worker thread names.
    pub thread_name: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: None,
            thread_name: "courier-delivery".to_string(),
        }
    }
}

impl DispatchConfig {
    /// Defaults overridden by `COURIER_WORKERS` / `COURIER_QUEUE_CAPACITY`.
    pub fn from_env() -> CourierResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> CourierResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(raw) = lookup(ENV_WORKERS) {
            cfg.workers = parse_usize(ENV_WORKERS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_QUEUE_CAPACITY) {
            let cap = parse_usize(ENV_QUEUE_CAPACITY, &raw)?;
            cfg.queue_capacity = (cap > 0).then_some(cap);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects settings the pool cannot run with.
    pub fn validate(&self) -> CourierResult<()> {
        if self.workers == 0 {
            return Err(invalid("workers", "must be at least 1"));
        }
        if self.queue_capacity == Some(0) {
            return Err(invalid(
                "queue_capacity",
                "must be at least 1 (omit for unbounded)",
            ));
        }
        if self.thread_name.trim().is_empty() {
            return Err(invalid("thread_name", "cannot be empty"));
        }
        Ok(())
    }
}

fn parse_usize(field: &str, raw: &str) -> CourierResult<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|e| invalid(field, &format!("'{raw}' is not a non-negative integer: {e}")))
}

fn invalid(field: &str, reason: &str) -> crate::error::CourierError {
    ValidationError::InvalidConfig {
        field: field.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_is_valid_and_unbounded() {
        let cfg = DispatchConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.queue_capacity, None);
    }

    #[test]
    fn env_overrides_apply() {
        let cfg = DispatchConfig::from_lookup(lookup(&[
            (ENV_WORKERS, "2"),
            (ENV_QUEUE_CAPACITY, "128"),
        ]))
        .unwrap();
        assert_eq!(cfg.workers, 2);
        assert_eq!(cfg.queue_capacity, Some(128));
    }

    #[test]
    fn zero_capacity_from_env_means_unbounded() {
        let cfg = DispatchConfig::from_lookup(lookup(&[(ENV_QUEUE_CAPACITY, "0")])).unwrap();
        assert_eq!(cfg.queue_capacity, None);
    }

    #[test]
    fn bad_values_are_rejected() {
        let err = DispatchConfig::from_lookup(lookup(&[(ENV_WORKERS, "many")])).unwrap_err();
        assert!(err.is_validation());
        assert!(format!("{err}").contains(ENV_WORKERS));

        let err = DispatchConfig::from_lookup(lookup(&[(ENV_WORKERS, "0")])).unwrap_err();
        assert!(format!("{err}").contains("workers"));

        let cfg = DispatchConfig {
            queue_capacity: Some(0),
            ..DispatchConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let cfg: DispatchConfig = serde_json::from_str(r#"{"workers": 1}"#).unwrap();
        assert_eq!(cfg.workers, 1);
        assert_eq!(cfg.thread_name, "courier-delivery");
    }
}
