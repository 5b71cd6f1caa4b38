use std::env;
use std::fmt;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the interview engine and its host.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub interview: InterviewConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let max_questions = read_number("INTERVIEW_MAX_QUESTIONS", 5_usize)?;
        let rating_step_ms = read_number("INTERVIEW_RATING_STEP_MS", 750_u64)?;
        let rating_max_tokens = read_number("INTERVIEW_RATING_MAX_TOKENS", 2000_u32)?;
        let save_attempts = read_number("INTERVIEW_SAVE_ATTEMPTS", 1_u32)?;
        let save_backoff_ms = read_number("INTERVIEW_SAVE_BACKOFF_MS", 250_u64)?;

        if max_questions == 0 {
            return Err(ConfigError::ZeroValue {
                key: "INTERVIEW_MAX_QUESTIONS",
            });
        }
        if save_attempts == 0 {
            return Err(ConfigError::ZeroValue {
                key: "INTERVIEW_SAVE_ATTEMPTS",
            });
        }

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            interview: InterviewConfig {
                max_questions,
                rating_step: Duration::from_millis(rating_step_ms),
                rating_max_tokens,
                save_attempts,
                save_backoff: Duration::from_millis(save_backoff_ms),
            },
        })
    }
}

fn read_number<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        _ => Ok(default),
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Tunables for question selection, assisted rating, and save retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewConfig {
    /// Upper bound on questions drawn per interview.
    pub max_questions: usize,
    /// Delay between consecutive increments of the rating animation.
    pub rating_step: Duration,
    pub rating_max_tokens: u32,
    /// Total write attempts per record, including the first one.
    pub save_attempts: u32,
    pub save_backoff: Duration,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            max_questions: 5,
            rating_step: Duration::from_millis(750),
            rating_max_tokens: 2000,
            save_attempts: 1,
            save_backoff: Duration::from_millis(250),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { key: &'static str },
    ZeroValue { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative whole number")
            }
            ConfigError::ZeroValue { key } => write!(f, "{key} must be greater than zero"),
        }
    }
}

impl std::error::Error for ConfigError {}
