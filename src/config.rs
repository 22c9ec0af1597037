//! Configuration for Bridgeway
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// Bridgeway - Q&A backend connecting seniors who ask with youth who answer
#[derive(Parser, Debug, Clone)]
#[command(name = "bridgeway")]
#[command(about = "Q&A backend connecting seniors who ask with youth who answer")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (insecure JWT fallback, Mongo optional)
    #[arg(long, env = "DEV_MODE", action = clap::ArgAction::Set, default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "bridgeway")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "3600")]
    pub jwt_expiry_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Page size cap for the pending-question browse list
    #[arg(long, env = "PENDING_PAGE_SIZE", default_value = "50")]
    pub pending_page_size: i64,

    /// Points credited to the author of an accepted answer
    #[arg(long, env = "ACCEPT_AWARD_POINTS", default_value = "100")]
    pub accept_award_points: i64,

    /// Interval in seconds between consistency sweep runs (0 disables)
    #[arg(long, env = "SWEEP_INTERVAL_SECS", default_value = "300")]
    pub sweep_interval_secs: u64,
}

impl Args {
    /// Get effective JWT secret (uses default in dev mode)
    pub fn jwt_secret(&self) -> String {
        if self.dev_mode {
            self.jwt_secret
                .clone()
                .unwrap_or_else(|| "dev-only-insecure-secret".to_string())
        } else {
            self.jwt_secret
                .clone()
                .expect("JWT_SECRET is required in production mode")
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        if self.pending_page_size <= 0 {
            return Err("PENDING_PAGE_SIZE must be positive".to_string());
        }

        if self.accept_award_points <= 0 {
            return Err("ACCEPT_AWARD_POINTS must be positive".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args::parse_from(["bridgeway", "--dev-mode", "true"])
    }

    #[test]
    fn test_dev_mode_jwt_fallback() {
        let args = base_args();
        assert_eq!(args.jwt_secret(), "dev-only-insecure-secret");
    }

    #[test]
    fn test_validate_requires_secret_in_production() {
        let args = Args::parse_from(["bridgeway"]);
        assert!(args.validate().is_err());

        let args = Args::parse_from(["bridgeway", "--jwt-secret", "s3cret"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_page_size() {
        let args = Args::parse_from(["bridgeway", "--dev-mode", "true", "--pending-page-size", "0"]);
        assert!(args.validate().is_err());
    }
}
