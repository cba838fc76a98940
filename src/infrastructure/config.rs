use crate::infrastructure::error::InfraError;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

const DASHBOARD_JSON: &str = "dashboard.json";
const SUPPORTED_SCHEMA: u8 = 1;
const DEFAULT_API_BASE_URL: &str = "https://localhost:8000/api/v1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PollingConfig {
    pub interval_seconds: u64,
    pub recent_track_limit: u32,
    pub track_window_minutes: u32,
    pub analyze_mood: bool,
    pub mood_window_minutes: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 30,
            recent_track_limit: 10,
            track_window_minutes: 60,
            analyze_mood: true,
            mood_window_minutes: 60,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsConfig {
    pub window_days: u32,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self { window_days: 7 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsConfig {
    pub limit: u32,
}

impl Default for RecommendationsConfig {
    fn default() -> Self {
        Self { limit: 1 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    pub schema: u8,
    pub api_base_url: String,
    pub timezone: String,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub statistics: StatisticsConfig,
    #[serde(default)]
    pub recommendations: RecommendationsConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            schema: SUPPORTED_SCHEMA,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timezone: "UTC".to_string(),
            polling: PollingConfig::default(),
            statistics: StatisticsConfig::default(),
            recommendations: RecommendationsConfig::default(),
        }
    }
}

impl DashboardConfig {
    pub fn validate(&self) -> Result<(), InfraError> {
        if self.schema != SUPPORTED_SCHEMA {
            return Err(InfraError::InvalidConfig(format!(
                "unsupported schema {}",
                self.schema
            )));
        }
        self.api_base_url()?;
        self.timezone()?;
        if self.polling.interval_seconds == 0 {
            return Err(InfraError::InvalidConfig(
                "polling.intervalSeconds must be > 0".to_string(),
            ));
        }
        if self.statistics.window_days == 0 {
            return Err(InfraError::InvalidConfig(
                "statistics.windowDays must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn api_base_url(&self) -> Result<Url, InfraError> {
        Url::parse(self.api_base_url.trim()).map_err(|error| {
            InfraError::InvalidConfig(format!("invalid apiBaseUrl '{}': {error}", self.api_base_url))
        })
    }

    pub fn timezone(&self) -> Result<Tz, InfraError> {
        self.timezone
            .trim()
            .parse::<Tz>()
            .map_err(|error| InfraError::InvalidConfig(format!("invalid timezone '{}': {error}", self.timezone)))
    }
}

pub fn ensure_default_config(config_dir: &Path) -> Result<(), InfraError> {
    let path = config_dir.join(DASHBOARD_JSON);
    if !path.exists() {
        let formatted = serde_json::to_string_pretty(&DashboardConfig::default())?;
        fs::write(path, format!("{formatted}\n"))?;
    }
    Ok(())
}

pub fn load_config(config_dir: &Path) -> Result<DashboardConfig, InfraError> {
    let path = config_dir.join(DASHBOARD_JSON);
    let raw = fs::read_to_string(&path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    if parsed.get("schema").and_then(serde_json::Value::as_u64).is_none() {
        return Err(InfraError::InvalidConfig(format!(
            "missing schema in {}",
            path.display()
        )));
    }

    let config: DashboardConfig = serde_json::from_value(parsed)?;
    config.validate().map_err(|error| match error {
        InfraError::InvalidConfig(message) => {
            InfraError::InvalidConfig(format!("{message} in {}", path.display()))
        }
        other => other,
    })?;
    Ok(config)
}
