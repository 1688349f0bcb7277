//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use blackjack_table::room::RoomConfig;
use std::net::{Ipv4Addr, SocketAddr};

/// Default bind address when neither the CLI nor the environment sets one
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
    6969,
);

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus exporter address; metrics are off when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Security configuration
    pub security: SecurityConfig,
    /// Settings every new room starts with
    pub room_defaults: RoomConfig,
    /// Chips a player starts with
    pub starting_balance: i64,
}

/// Security-related configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// JWT signing secret (required)
    pub jwt_secret: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `metrics_override` - Optional metrics address override (from CLI args)
    ///
    /// # Returns
    ///
    /// * `Result<ServerConfig, ConfigError>` - Loaded configuration or error
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        metrics_override: Option<SocketAddr>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_or("SERVER_BIND", DEFAULT_BIND),
        };

        let metrics_bind = match metrics_override {
            Some(addr) => Some(addr),
            None => match std::env::var("METRICS_BIND") {
                Ok(raw) => Some(raw.parse().map_err(|_| ConfigError::Invalid {
                    var: "METRICS_BIND".to_string(),
                    reason: format!("'{raw}' is not a socket address"),
                })?),
                Err(_) => None,
            },
        };

        // Security configuration (REQUIRED)
        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        let defaults = RoomConfig::default();
        let room_defaults = RoomConfig {
            num_seats: parse_env_or("ROOM_SEATS", defaults.num_seats),
            min_bet: parse_env_or("ROOM_MIN_BET", defaults.min_bet),
            max_bet: parse_env_or("ROOM_MAX_BET", defaults.max_bet),
            max_hands_per_seat: parse_env_or("ROOM_MAX_HANDS_PER_SEAT", defaults.max_hands_per_seat),
            shuffle_delay_ms: parse_env_or("SHUFFLE_DELAY_MS", defaults.shuffle_delay_ms),
            deal_delay_ms: parse_env_or("DEAL_DELAY_MS", defaults.deal_delay_ms),
            dealer_draw_delay_ms: parse_env_or("DEALER_DRAW_DELAY_MS", defaults.dealer_draw_delay_ms),
            round_over_delay_ms: parse_env_or("ROUND_OVER_DELAY_MS", defaults.round_over_delay_ms),
            disconnect_grace_ms: parse_env_or("DISCONNECT_GRACE_MS", defaults.disconnect_grace_ms),
            active_throttle_ms: parse_env_or("ACTIVE_THROTTLE_MS", defaults.active_throttle_ms),
            slow_throttle_ms: parse_env_or("SLOW_THROTTLE_MS", defaults.slow_throttle_ms),
            tick_interval_ms: parse_env_or("TICK_INTERVAL_MS", defaults.tick_interval_ms),
            chat_history_limit: parse_env_or("CHAT_HISTORY_LIMIT", defaults.chat_history_limit),
            empty_room_timeout_ms: parse_env_or(
                "EMPTY_ROOM_TIMEOUT_MS",
                defaults.empty_room_timeout_ms,
            ),
        };

        Ok(ServerConfig {
            bind,
            metrics_bind,
            security: SecurityConfig { jwt_secret },
            room_defaults,
            starting_balance: parse_env_or(
                "STARTING_BALANCE",
                blackjack_table::wallet::DEFAULT_STARTING_BALANCE,
            ),
        })
    }

    /// Validate configuration after loading
    ///
    /// # Returns
    ///
    /// * `Result<(), ConfigError>` - Success or validation error
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: "Must be at least 32 characters (128-bit security)".to_string(),
            });
        }

        if self.starting_balance < 0 {
            return Err(ConfigError::Invalid {
                var: "STARTING_BALANCE".to_string(),
                reason: "Must not be negative".to_string(),
            });
        }

        self.room_defaults
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                var: "ROOM_*".to_string(),
                reason,
            })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            bind: DEFAULT_BIND,
            metrics_bind: None,
            security: SecurityConfig {
                jwt_secret: "a".repeat(32),
            },
            room_defaults: RoomConfig::default(),
            starting_balance: 1000,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("JWT_SECRET"));
        assert!(msg.contains("Use openssl"));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_short_secret() {
        let mut config = config();
        config.security.jwt_secret = "too_short".to_string();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "JWT_SECRET"));
    }

    #[test]
    fn test_config_validation_room_defaults() {
        let mut config = config();
        config.room_defaults.num_seats = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Seats must be between 1 and 7"));
    }

    #[test]
    fn test_parse_env_or_falls_back() {
        assert_eq!(parse_env_or("BT_SERVER_SURELY_UNSET_VAR", 42u64), 42);
    }
}
