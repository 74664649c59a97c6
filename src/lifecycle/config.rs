//! # Configuration
//!
//! [`SimConfig`] is read once at process start and handed to the supervisor,
//! which passes each actor only what it needs. Nothing reads the environment
//! after that.
//!
//! | variable           | default                                  |
//! |--------------------|------------------------------------------|
//! | `API_BASE_URL`     | required                                 |
//! | `AUTH_URL`         | `https://identitytoolkit.googleapis.com` |
//! | `FIREBASE_API_KEY` | empty                                    |
//! | `SIM_USERS`        | `[]`                                     |
//! | `CITY_DATA_DIR`    | `data/random-city-data`                  |
//! | `TIME_MULTIPLIER`  | `16`                                     |
//! | `SIM_AUTOSTART`    | `true`                                   |
//!
//! `SIM_USERS` is a JSON array of `{"email", "password", "isRider", "city"}`
//! objects; `isRider` defaults to `false` and `city` is required for riders.

use super::ActorRole;
use crate::clients::AuthSettings;
use crate::framework::DEFAULT_TIME_MULTIPLIER;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

pub const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_CITY_DATA_DIR: &str = "data/random-city-data";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required variable {0}")]
    Missing(&'static str),

    #[error("{var} is not a valid url: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("SIM_USERS is not a valid user list: {0}")]
    InvalidUsers(#[from] serde_json::Error),

    #[error("{var} has invalid value {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("rider {0} has no city")]
    RiderWithoutCity(String),
}

/// Credentials and role of one simulated account.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_rider: bool,
    #[serde(default)]
    pub city: String,
}

impl UserConfig {
    pub fn role(&self) -> ActorRole {
        if self.is_rider {
            ActorRole::Rider
        } else {
            ActorRole::Driver
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub api_base_url: Url,
    pub auth_url: Url,
    pub auth_api_key: String,
    pub users: Vec<UserConfig>,
    pub city_data_dir: PathBuf,
    pub time_multiplier: f64,
    pub autostart: bool,
}

impl SimConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base_url = get("API_BASE_URL").ok_or(ConfigError::Missing("API_BASE_URL"))?;
        let api_base_url = parse_url("API_BASE_URL", &api_base_url)?;

        let auth_url = get("AUTH_URL").unwrap_or_else(|| DEFAULT_AUTH_URL.to_string());
        let auth_url = parse_url("AUTH_URL", &auth_url)?;

        let users: Vec<UserConfig> = match get("SIM_USERS") {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };
        if let Some(rider) = users.iter().find(|u| u.is_rider && u.city.trim().is_empty()) {
            return Err(ConfigError::RiderWithoutCity(rider.email.clone()));
        }

        let time_multiplier = match get("TIME_MULTIPLIER") {
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(m) if m.is_finite() && m > 0.0 => m,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "TIME_MULTIPLIER",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_TIME_MULTIPLIER,
        };

        let autostart = match get("SIM_AUTOSTART") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidValue {
                var: "SIM_AUTOSTART",
                value: raw,
            })?,
            None => true,
        };

        Ok(Self {
            api_base_url,
            auth_url,
            auth_api_key: get("FIREBASE_API_KEY").unwrap_or_default(),
            users,
            city_data_dir: get("CITY_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CITY_DATA_DIR)),
            time_multiplier,
            autostart,
        })
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            url: self.auth_url.clone(),
            api_key: self.auth_api_key.clone(),
        }
    }
}

fn parse_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { var, source })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<SimConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SimConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("API_BASE_URL", "http://localhost:8080")]).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.auth_url.as_str(), "https://identitytoolkit.googleapis.com/");
        assert_eq!(config.auth_api_key, "");
        assert!(config.users.is_empty());
        assert_eq!(config.city_data_dir, PathBuf::from("data/random-city-data"));
        assert_eq!(config.time_multiplier, 16.0);
        assert!(config.autostart);
    }

    #[test]
    fn test_missing_base_url() {
        assert!(matches!(
            config(&[]),
            Err(ConfigError::Missing("API_BASE_URL"))
        ));
        assert!(matches!(
            config(&[("API_BASE_URL", "not a url")]),
            Err(ConfigError::InvalidUrl { var: "API_BASE_URL", .. })
        ));
    }

    #[test]
    fn test_users_and_roles() {
        let users = r#"[
            {"email": "d@example.com", "password": "pw"},
            {"email": "r@example.com", "password": "pw", "isRider": true, "city": "berlin"}
        ]"#;
        let config = config(&[
            ("API_BASE_URL", "http://localhost:8080"),
            ("SIM_USERS", users),
            ("TIME_MULTIPLIER", "60"),
            ("SIM_AUTOSTART", "off"),
        ])
        .unwrap();

        assert_eq!(config.users.len(), 2);
        assert_eq!(config.users[0].role(), ActorRole::Driver);
        assert_eq!(config.users[1].role(), ActorRole::Rider);
        assert_eq!(config.users[1].city, "berlin");
        assert_eq!(config.time_multiplier, 60.0);
        assert!(!config.autostart);
    }

    #[test]
    fn test_rejects_bad_values() {
        let base = ("API_BASE_URL", "http://localhost:8080");
        assert!(matches!(
            config(&[base, ("SIM_USERS", "{")]),
            Err(ConfigError::InvalidUsers(_))
        ));
        assert!(matches!(
            config(&[base, ("TIME_MULTIPLIER", "-1")]),
            Err(ConfigError::InvalidValue { var: "TIME_MULTIPLIER", .. })
        ));
        assert!(matches!(
            config(&[base, ("SIM_AUTOSTART", "maybe")]),
            Err(ConfigError::InvalidValue { var: "SIM_AUTOSTART", .. })
        ));
        assert!(matches!(
            config(&[
                base,
                ("SIM_USERS", r#"[{"email":"r@x","password":"p","isRider":true}]"#)
            ]),
            Err(ConfigError::RiderWithoutCity(_))
        ));
    }
}
