use std::env;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("PORT must be a number, got {0}")]
    InvalidPort(String),
    #[error("BACKUP_TIME must be HH:MM, got {0}")]
    InvalidBackupTime(String),
    #[error("SEED_SAMPLE_DATA must be true or false, got {0}")]
    InvalidSeedFlag(String),
}

/// Local time of day for the daily backup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupTime {
    pub hour: u32,
    pub minute: u32,
}

impl FromStr for BackupTime {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidBackupTime(s.to_string());

        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;

        if hour > 23 || minute > 59 {
            return Err(invalid());
        }
        Ok(Self { hour, minute })
    }
}

impl fmt::Display for BackupTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub static_files_path: Option<String>,
    pub cors_origins: Vec<String>,
    pub seed_sample_data: bool,
    pub backup_dir: Option<String>,
    pub backup_time: Option<BackupTime>,
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
        let seed = env::var("SEED_SAMPLE_DATA").unwrap_or_default();

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: port.parse().map_err(|_| ConfigError::InvalidPort(port.clone()))?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:gym_data.sqlite?mode=rwc".to_string()),
            static_files_path: env::var("STATIC_FILES_PATH").ok(),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost".to_string())
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            seed_sample_data: parse_flag(&seed).ok_or(ConfigError::InvalidSeedFlag(seed.clone()))?,
            backup_dir: env::var("BACKUP_DIR").ok().filter(|dir| !dir.trim().is_empty()),
            backup_time: env::var("BACKUP_TIME")
                .ok()
                .filter(|time| !time.trim().is_empty())
                .map(|time| time.parse())
                .transpose()?,
        })
    }
}
