//! Configuration management for the Stockscan server

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Remote stock / order API endpoints
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub stock_check_path: String,
    pub stocktake_path: String,
    pub reference_path: String,
    pub orders_captured_path: String,
    pub orders_status_path: String,
    pub orders_uncaptured_path: String,
    pub orders_capture_path: String,
    pub trip_sheet_path: String,
    pub delivery_note_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScannerBackend {
    /// Frames are decoded on the station and pushed over HTTP
    Push,
    /// Hardware scanner emitting one code per line on a character device
    Serial,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScannerConfig {
    pub backend: ScannerBackend,
    pub devices: Vec<DeviceConfig>,
    pub device_dir: String,
    /// Sessions untouched for this long are torn down; 0 keeps them forever
    pub idle_timeout_seconds: u64,
}

/// Per-station behaviour of the scan session
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct StationConfig {
    pub stamp_operator: bool,
    pub require_operator: bool,
    pub camera_toggle: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(default)]
pub struct StockTakeConfig {
    pub idempotency_keys: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub station: StationConfig,
    #[serde(default)]
    pub stocktake: StockTakeConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // STOCKSCAN_API__BASE_URL, STOCKSCAN_STATION__CAMERA_TOGGLE, ...
            .add_source(
                Environment::with_prefix("STOCKSCAN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("api.base_url", env::var("API_BASE_URL").ok())?
            .set_override_option("auth.jwt_secret", env::var("JWT_SECRET").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9191".to_string(),
            timeout_seconds: 15,
            stock_check_path: "/sage/stock/check/bybarcode".to_string(),
            stocktake_path: "/toms/warehouse/stocktake".to_string(),
            reference_path: "/toms/warehouse/stocktake/ref".to_string(),
            orders_captured_path: "/sales/fetchcaptured".to_string(),
            orders_status_path: "/sales/changestatus".to_string(),
            orders_uncaptured_path: "/sales/getuncaptured".to_string(),
            orders_capture_path: "/sales/captureorder".to_string(),
            trip_sheet_path: "/toms/tripsheet".to_string(),
            delivery_note_path: "/toms/dn/fetch".to_string(),
        }
    }
}

impl ApiConfig {
    /// Join the base URL with an endpoint path
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-this-secret-in-production".to_string(),
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            backend: ScannerBackend::Push,
            devices: vec![DeviceConfig {
                id: "environment".to_string(),
                label: "Back camera".to_string(),
            }],
            device_dir: "/dev/serial/by-id".to_string(),
            idle_timeout_seconds: 900,
        }
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            stamp_operator: true,
            require_operator: false,
            camera_toggle: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
