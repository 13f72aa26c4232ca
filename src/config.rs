use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub node: NodeConfig,
    pub routing: RoutingConfig,
    /// Enables dangerous operations like purge. Must never be true in production.
    pub test_mode: bool,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_address: String,
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub struct RoutingConfig {
    /// Maximum number of memoized path resolutions
    pub cache_capacity: usize,
    /// Maximum alias length in characters
    pub max_alias_length: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            data_dir: "./data".to_string(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 4096,
            max_alias_length: 255,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let test_mode = std::env::var("TEST_MODE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let cache_capacity = std::env::var("ROUTE_CACHE_CAPACITY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(4096);

        let max_alias_length = std::env::var("MAX_ALIAS_LENGTH")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(255);

        let config = Config {
            node: NodeConfig {
                bind_address,
                data_dir,
            },
            routing: RoutingConfig {
                cache_capacity,
                max_alias_length,
            },
            test_mode,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.node.data_dir.is_empty() {
            return Err(ConfigError::ValidationError(
                "DATA_DIR cannot be empty".to_string(),
            ));
        }

        if self.routing.cache_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "ROUTE_CACHE_CAPACITY must be greater than 0".to_string(),
            ));
        }

        if !(1..=2048).contains(&self.routing.max_alias_length) {
            return Err(ConfigError::ValidationError(
                "MAX_ALIAS_LENGTH must be between 1 and 2048".to_string(),
            ));
        }

        if self.test_mode {
            tracing::warn!("TEST_MODE is enabled. Do not run this configuration in production.");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            node: NodeConfig::default(),
            routing: RoutingConfig::default(),
            test_mode: false,
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_zero_cache_capacity_rejected() {
        let mut config = config();
        config.routing.cache_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_alias_length_bounds() {
        let mut config = config();
        config.routing.max_alias_length = 0;
        assert!(config.validate().is_err());
        config.routing.max_alias_length = 4096;
        assert!(config.validate().is_err());
    }
}
