//! Service settings, read from command-line flags and environment variables.
//!
//! Every field can be set through its env var (optionally from a `.env` file
//! loaded by the binary) or the matching `--flag`. [`Settings::default`]
//! yields the documented defaults without consulting the environment.

use std::fmt;
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Deployment environment the service reports itself as running in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Local,
    Test,
    Prod,
}

impl Environment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Test => "test",
            Self::Prod => "prod",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level configuration for the service.
#[derive(Debug, Clone, Parser)]
#[command(name = "stratum-server", version, about = "Multi-tenant HTTP API service")]
pub struct Settings {
    /// Application name reported in logs.
    #[arg(long, env = "APP_NAME", default_value = "stratum")]
    pub app_name: String,

    #[arg(long, env = "ENVIRONMENT", value_enum, default_value_t = Environment::Local)]
    pub environment: Environment,

    /// Human-readable logs at debug level instead of JSON at `log_level`.
    #[arg(long, env = "DEBUG", default_value_t = false, action = clap::ArgAction::Set)]
    pub debug: bool,

    /// Bind address for the server.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on. 0 means OS-assigned.
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Maximum time a request may take before it is cancelled with 408.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Export spans over OTLP (requires the `otel` feature).
    #[arg(long, env = "OTEL_ENABLED", default_value_t = false, action = clap::ArgAction::Set)]
    pub otel_enabled: bool,

    #[arg(long, env = "OTEL_ENDPOINT", default_value = "http://localhost:4317")]
    pub otel_endpoint: String,

    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "stratum")]
    pub otel_service_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "stratum".to_string(),
            environment: Environment::Local,
            debug: false,
            host: "0.0.0.0".to_string(),
            port: 8000,
            request_timeout_secs: 30,
            log_level: "info".to_string(),
            otel_enabled: false,
            otel_endpoint: "http://localhost:4317".to_string(),
            otel_service_name: "stratum".to_string(),
        }
    }
}

impl Settings {
    /// Parses flags and environment variables of the running process.
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Filter directive used when `RUST_LOG` is unset.
    #[must_use]
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.log_level
        }
    }

    /// JSON output for log aggregation everywhere except debug sessions.
    #[must_use]
    pub fn json_logs(&self) -> bool {
        !self.debug
    }

    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.app_name, "stratum");
        assert_eq!(settings.environment, Environment::Local);
        assert!(!settings.debug);
        assert_eq!(settings.bind_addr(), "0.0.0.0:8000");
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.effective_log_level(), "info");
        assert!(settings.json_logs());
        assert!(!settings.otel_enabled);
        assert_eq!(settings.otel_endpoint, "http://localhost:4317");
    }

    #[test]
    fn flags_override_defaults() {
        let settings = Settings::try_parse_from([
            "stratum-server",
            "--port",
            "9100",
            "--environment",
            "prod",
            "--debug",
            "true",
            "--request-timeout-secs",
            "5",
        ])
        .expect("valid flags");
        assert_eq!(settings.port, 9100);
        assert_eq!(settings.environment, Environment::Prod);
        assert_eq!(settings.effective_log_level(), "debug");
        assert!(!settings.json_logs());
        assert_eq!(settings.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let result = Settings::try_parse_from(["stratum-server", "--environment", "staging"]);
        assert!(result.is_err());
    }

    #[test]
    fn environment_display() {
        assert_eq!(Environment::Local.to_string(), "local");
        assert_eq!(Environment::Test.to_string(), "test");
        assert_eq!(Environment::Prod.to_string(), "prod");
    }
}
