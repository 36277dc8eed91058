//! Settings read from the environment (and `.env`, loaded by `main`).
//!
//! | variable                | default          |
//! |-------------------------|------------------|
//! | `API_KEY`               | empty            |
//! | `BASE_URL`              | `localhost:8000` |
//! | `INITIAL_BACKOFF`       | `1` (seconds)    |
//! | `BACKOFF_MULTIPLIER`    | `1.5`            |
//! | `MAX_RETRIES`           | `5`              |
//! | `LOOKBACK_DAYS`         | `7`              |
//! | `DEFAULT_OUTPUT_PATH`   | `output`         |
//! | `DEFAULT_OUTPUT_FORMAT` | `parquet`        |
//! | `LOG_LEVEL`             | `info`           |

use anyhow::{anyhow, bail, Context, Result};
use renewables_core::{OutputFormat, RetryPolicy};
use renewables_runner::DEFAULT_LOOKBACK_DAYS;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_key: String,
    pub base_url: String,
    pub retry: RetryPolicy,
    pub lookback_days: u32,
    pub output_path: PathBuf,
    pub output_format: OutputFormat,
    /// Normalized `tracing` level name.
    pub log_level: &'static str,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset or blank keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let initial_backoff: f64 = parse_var(&get, "INITIAL_BACKOFF", 1.0)?;
        let initial_backoff = Duration::try_from_secs_f64(initial_backoff).map_err(|_| {
            anyhow!("INITIAL_BACKOFF must be a non-negative number of seconds, got {initial_backoff}")
        })?;
        let multiplier: f64 = parse_var(&get, "BACKOFF_MULTIPLIER", 1.5)?;
        if !multiplier.is_finite() || multiplier < 1.0 {
            bail!("BACKOFF_MULTIPLIER must be at least 1.0, got {multiplier}");
        }

        let output_format = match get("DEFAULT_OUTPUT_FORMAT") {
            Some(raw) => raw
                .parse::<OutputFormat>()
                .map_err(|e| anyhow!(e))
                .context("invalid DEFAULT_OUTPUT_FORMAT")?,
            None => OutputFormat::default(),
        };

        let log_level = match get("LOG_LEVEL") {
            Some(raw) => normalize_level(&raw)?,
            None => "info",
        };

        Ok(Self {
            api_key: lookup("API_KEY").unwrap_or_default(),
            base_url: get("BASE_URL").unwrap_or_else(|| "localhost:8000".to_string()),
            retry: RetryPolicy {
                initial_backoff,
                multiplier,
                max_retries: parse_var(&get, "MAX_RETRIES", 5)?,
            },
            lookback_days: parse_var(&get, "LOOKBACK_DAYS", DEFAULT_LOOKBACK_DAYS)?,
            output_path: get("DEFAULT_OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("output")),
            output_format,
            log_level,
        })
    }
}

fn parse_var<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid {key} '{raw}': {e}")),
        None => Ok(default),
    }
}

/// Accept the usual level spellings, including `WARNING` and `CRITICAL`.
fn normalize_level(raw: &str) -> Result<&'static str> {
    let level = match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" | "critical" => "error",
        "off" => "off",
        other => bail!("invalid LOG_LEVEL '{other}'"),
    };
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.api_key, "");
        assert_eq!(s.base_url, "localhost:8000");
        assert_eq!(s.retry, RetryPolicy::default());
        assert_eq!(s.lookback_days, 7);
        assert_eq!(s.output_path, PathBuf::from("output"));
        assert_eq!(s.output_format, OutputFormat::Parquet);
        assert_eq!(s.log_level, "info");
    }

    #[test]
    fn reads_overrides() {
        let s = settings(&[
            ("API_KEY", "abc"),
            ("BASE_URL", "https://api.example.com"),
            ("INITIAL_BACKOFF", "0.5"),
            ("MAX_RETRIES", "2"),
            ("LOOKBACK_DAYS", "3"),
            ("DEFAULT_OUTPUT_FORMAT", "CSV"),
            ("LOG_LEVEL", "WARNING"),
        ])
        .unwrap();
        assert_eq!(s.api_key, "abc");
        assert_eq!(s.retry.initial_backoff, Duration::from_millis(500));
        assert_eq!(s.retry.max_retries, 2);
        assert_eq!(s.lookback_days, 3);
        assert_eq!(s.output_format, OutputFormat::Csv);
        assert_eq!(s.log_level, "warn");
    }

    #[test]
    fn rejects_bad_numbers_and_formats() {
        let err = settings(&[("MAX_RETRIES", "many")]).unwrap_err();
        assert!(err.to_string().contains("MAX_RETRIES"));

        assert!(settings(&[("BACKOFF_MULTIPLIER", "0.5")]).is_err());
        assert!(settings(&[("INITIAL_BACKOFF", "-1")]).is_err());
        assert!(settings(&[("DEFAULT_OUTPUT_FORMAT", "xlsx")]).is_err());
        assert!(settings(&[("LOG_LEVEL", "loud")]).is_err());
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let s = settings(&[("LOOKBACK_DAYS", "  "), ("BASE_URL", "")]).unwrap();
        assert_eq!(s.lookback_days, 7);
        assert_eq!(s.base_url, "localhost:8000");
    }
}
