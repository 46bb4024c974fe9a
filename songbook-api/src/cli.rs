//! Command-line arguments
//!
//! Every flag has an environment fallback; anything left unset falls through
//! to the TOML file and then the built-in default.

use std::path::PathBuf;

use clap::Parser;
use songbook_common::config::ConfigOverrides;

/// Command-line arguments for songbook-api
#[derive(Parser, Debug, Default)]
#[command(name = "songbook-api")]
#[command(about = "Song library HTTP service")]
#[command(version)]
pub struct Args {
    /// TOML config file
    #[arg(short, long, env = "SONGBOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "SONGBOOK_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "SONGBOOK_PORT")]
    pub port: Option<u16>,

    /// SQLite database file
    #[arg(short, long, env = "SONGBOOK_DATABASE")]
    pub database: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, env = "SONGBOOK_LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl From<Args> for ConfigOverrides {
    fn from(args: Args) -> Self {
        ConfigOverrides {
            config_file: args.config,
            host: args.host,
            port: args.port,
            database: args.database,
            log_level: args.log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = [
        "SONGBOOK_CONFIG",
        "SONGBOOK_HOST",
        "SONGBOOK_PORT",
        "SONGBOOK_DATABASE",
        "SONGBOOK_LOG_LEVEL",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_no_flags_no_env() {
        clear_env();
        let args = Args::try_parse_from(["songbook-api"]).unwrap();
        let overrides = ConfigOverrides::from(args);
        assert_eq!(overrides.host, None);
        assert_eq!(overrides.port, None);
        assert_eq!(overrides.database, None);
    }

    #[test]
    #[serial]
    fn test_env_fallback() {
        clear_env();
        std::env::set_var("SONGBOOK_PORT", "9090");
        std::env::set_var("SONGBOOK_DATABASE", "/tmp/songs.db");

        let args = Args::try_parse_from(["songbook-api"]).unwrap();
        assert_eq!(args.port, Some(9090));
        assert_eq!(args.database, Some(PathBuf::from("/tmp/songs.db")));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_flag_beats_env() {
        clear_env();
        std::env::set_var("SONGBOOK_PORT", "9090");
        std::env::set_var("SONGBOOK_LOG_LEVEL", "warn");

        let args =
            Args::try_parse_from(["songbook-api", "--port", "7000", "--log-level", "debug"])
                .unwrap();
        assert_eq!(args.port, Some(7000));
        assert_eq!(args.log_level.as_deref(), Some("debug"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_port_rejected() {
        clear_env();
        assert!(Args::try_parse_from(["songbook-api", "--port", "eighty"]).is_err());
    }
}
