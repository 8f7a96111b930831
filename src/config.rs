use thiserror::Error;

use crate::properties::{Properties, SERVER_KEY, TOKEN_KEY};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // Base URL of the backend, scheme included.
    pub server: String,
    // Sent verbatim as the X-AUTH-TOKEN header.
    pub token: String,
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("property {0} is required to query the backend")]
    Missing(&'static str),
    #[error("property {0} must not be empty")]
    Empty(&'static str),
}

impl Config {
    pub fn from_properties(properties: &Properties) -> Result<Self, ConfigError> {
        let server = properties
            .get(SERVER_KEY)
            .ok_or(ConfigError::Missing(SERVER_KEY))?;
        let token = properties
            .get(TOKEN_KEY)
            .ok_or(ConfigError::Missing(TOKEN_KEY))?;
        let config = Self {
            server: normalize_server(server),
            token: token.to_string(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.is_empty() {
            return Err(ConfigError::Empty(SERVER_KEY));
        }
        if self.token.is_empty() {
            return Err(ConfigError::Empty(TOKEN_KEY));
        }
        Ok(())
    }
}

// Bare host names are accepted and default to https.
fn normalize_server(server: &str) -> String {
    let server = server.trim().trim_end_matches('/');
    if server.is_empty() || server.contains("://") {
        server.to_string()
    } else {
        format!("https://{server}")
    }
}
