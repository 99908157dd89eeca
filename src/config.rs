// src/config.rs

use std::env;
use std::fmt;
use std::str::FromStr;

use dotenvy::dotenv;

/// Scoring defaults applied by the grader when a quiz does not override them.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Penalty per wrong answer for quizzes with negative marking but no explicit penalty.
    pub default_negative_mark: f64,
    /// Lowest final score a submission can reach once penalties are applied.
    pub score_floor: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            default_negative_mark: 0.25,
            score_floor: 0.0,
        }
    }
}

impl ScoringConfig {
    /// Penalty must be finite and non-negative. The floor must be finite and at most
    /// zero, otherwise a submission with no correct answers could score above 100%.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.default_negative_mark.is_finite() || self.default_negative_mark < 0.0 {
            return Err(ConfigError::Invalid {
                key: "NEGATIVE_MARK_DEFAULT",
                value: self.default_negative_mark.to_string(),
            });
        }
        if !self.score_floor.is_finite() || self.score_floor > 0.0 {
            return Err(ConfigError::Invalid {
                key: "SCORE_FLOOR",
                value: self.score_floor.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardConfig {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string. `None` runs the service on the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub scoring: ScoringConfig,
    pub leaderboard: LeaderboardConfig,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "{} has an invalid value: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let scoring_defaults = ScoringConfig::default();
        let leaderboard_defaults = LeaderboardConfig::default();

        let scoring = ScoringConfig {
            default_negative_mark: parse_or(
                "NEGATIVE_MARK_DEFAULT",
                scoring_defaults.default_negative_mark,
            )?,
            score_floor: parse_or("SCORE_FLOOR", scoring_defaults.score_floor)?,
        };
        scoring.validate()?;

        let leaderboard = LeaderboardConfig {
            default_limit: parse_or(
                "LEADERBOARD_DEFAULT_LIMIT",
                leaderboard_defaults.default_limit,
            )?,
            max_limit: parse_or("LEADERBOARD_MAX_LIMIT", leaderboard_defaults.max_limit)?,
        };
        if leaderboard.default_limit < 1 || leaderboard.max_limit < leaderboard.default_limit {
            return Err(ConfigError::Invalid {
                key: "LEADERBOARD_DEFAULT_LIMIT",
                value: leaderboard.default_limit.to_string(),
            });
        }

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration: parse_or("JWT_EXPIRATION", 86_400)?,
            rust_log,
            port: parse_or("PORT", 3000)?,
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            scoring,
            leaderboard,
        })
    }
}

/// Reads `key` from the environment, falling back to `default` when unset.
fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}
