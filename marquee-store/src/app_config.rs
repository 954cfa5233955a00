use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: Option<RedisConfig>,
    pub kafka: Option<KafkaConfig>,
    pub auth: AuthConfig,
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub booking: BookingRules,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingRules {
    #[serde(default = "default_payment_success_rate")]
    pub payment_success_rate: f64,
    #[serde(default = "default_reconciliation_interval")]
    pub reconciliation_interval_seconds: u64,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: i64,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            payment_success_rate: default_payment_success_rate(),
            reconciliation_interval_seconds: default_reconciliation_interval(),
            rate_limit_per_minute: default_rate_limit(),
        }
    }
}

fn default_payment_success_rate() -> f64 { 0.9 }
fn default_reconciliation_interval() -> u64 { 60 }
fn default_rate_limit() -> i64 { 100 }
fn default_max_connections() -> u32 { 5 }
fn default_ledger_timeout() -> u64 { 5000 }
fn default_smtp_port() -> u16 { 587 }
fn default_topic() -> String { "booking.lifecycle".to_string() }

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Shared secret the event service presents on maintenance calls.
    pub internal_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    #[serde(default = "default_topic")]
    pub topic: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    pub base_url: String,
    #[serde(default = "default_ledger_timeout")]
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub from_address: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Untracked local overrides
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `MARQUEE__SERVER__PORT=8081`
            .add_source(config::Environment::with_prefix("MARQUEE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_sections() {
        let raw = r#"
            [server]
            port = 8080

            [database]
            url = "postgres://localhost/marquee"

            [auth]
            jwt_secret = "secret"
            internal_token = "internal"

            [ledger]
            base_url = "http://localhost:5001/api"
        "#;

        let cfg: Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.booking.payment_success_rate, 0.9);
        assert_eq!(cfg.booking.reconciliation_interval_seconds, 60);
        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.ledger.timeout_ms, 5000);
        assert!(cfg.redis.is_none());
        assert!(cfg.smtp.is_none());
    }
}
