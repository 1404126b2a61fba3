use crate::interface_adapters::pipeline::{ConfigError, CredentialPolicy, parse_base_url};
use std::env;
use std::path::PathBuf;

// Runtime configuration read from the environment (after `.env` is loaded).

pub const API_URL_VAR: &str = "ADMIN_API_URL";
pub const CREDENTIALS_VAR: &str = "ADMIN_API_CREDENTIALS";
pub const SESSION_FILE_VAR: &str = "ADMIN_SESSION_FILE";

pub const DEFAULT_SESSION_FILE: &str = ".admin_session.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub credentials: CredentialPolicy,
    pub session_file: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    // A missing or unusable base URL fails here, before any request is built.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url = lookup(API_URL_VAR)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingVar(API_URL_VAR))?;
        parse_base_url(&api_base_url)?;

        let credentials = match lookup(CREDENTIALS_VAR) {
            Some(value) => value.parse()?,
            None => CredentialPolicy::default(),
        };

        let session_file = lookup(SESSION_FILE_VAR)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_FILE.to_string())
            .into();

        Ok(Self {
            api_base_url,
            credentials,
            session_file,
        })
    }
}
