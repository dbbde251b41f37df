use std::net::SocketAddr;
use clap::Parser;

use crate::pagination::{DEFAULT_LIMIT, MAX_LIMIT};

/// freight-ops: consignment lifecycle and pickup intake service
#[derive(Parser, Debug, Clone)]
#[command(name = "freight-ops")]
#[command(about = "Consignment, pickup and truck queue service for a multi-branch freight forwarder")]
pub struct Config {
    /// Address the HTTP API binds to
    #[arg(long, env = "FREIGHT_OPS_BIND", default_value = "127.0.0.1")]
    pub bind: String,

    /// HTTP port
    #[arg(long, env = "FREIGHT_OPS_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Mount /metrics and /health
    #[arg(long, env = "FREIGHT_OPS_METRICS", default_value_t = true, action = clap::ArgAction::Set)]
    pub metrics: bool,

    /// Log filter, takes precedence over RUST_LOG
    #[arg(long, env = "FREIGHT_OPS_LOG")]
    pub log: Option<String>,

    /// Page size when a list request names none
    #[arg(long, env = "FREIGHT_OPS_DEFAULT_LIMIT", default_value_t = DEFAULT_LIMIT,
          value_parser = clap::value_parser!(u32).range(1..=MAX_LIMIT as i64))]
    pub default_limit: u32,

    /// Seed demo branches, customers, trucks and bearer tokens
    #[arg(long, env = "FREIGHT_OPS_SEED_DEMO")]
    pub seed_demo: bool,
}

impl Config {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.bind, self.port).parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["freight-ops"]);
        assert_eq!(config.port, 8080);
        assert!(config.metrics);
        assert!(!config.seed_demo);
        assert_eq!(config.default_limit, DEFAULT_LIMIT);
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_flags() {
        let config = Config::parse_from([
            "freight-ops",
            "--port",
            "9000",
            "--metrics",
            "false",
            "--default-limit",
            "25",
            "--seed-demo",
        ]);
        assert_eq!(config.port, 9000);
        assert!(!config.metrics);
        assert_eq!(config.default_limit, 25);
        assert!(config.seed_demo);
    }

    #[test]
    fn test_limit_is_bounded() {
        assert!(Config::try_parse_from(["freight-ops", "--default-limit", "0"]).is_err());
        assert!(Config::try_parse_from(["freight-ops", "--default-limit", "500"]).is_err());
    }
}
