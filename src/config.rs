use crate::calculations::STREAK_HORIZON_WEEKS;
use crate::errors::StoreError;
use crate::store::{DEFAULT_KEY, validate_key};
use std::{env, net::SocketAddr, path::PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub workspace: String,
    pub streak_horizon_weeks: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            data_dir: PathBuf::from("data"),
            workspace: DEFAULT_KEY.to_string(),
            streak_horizon_weeks: STREAK_HORIZON_WEEKS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source. Numbers that fail
    /// to parse keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StoreError> {
        let defaults = Self::default();
        let config = Self {
            port: lookup("PORT")
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(defaults.port),
            data_dir: lookup("APP_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            workspace: lookup("APP_WORKSPACE").unwrap_or(defaults.workspace),
            streak_horizon_weeks: lookup("STREAK_HORIZON_WEEKS")
                .and_then(|value| value.parse::<u32>().ok())
                .filter(|weeks| *weeks > 0)
                .unwrap_or(defaults.streak_horizon_weeks),
        };
        validate_key(&config.workspace)?;
        Ok(config)
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}
