// server/src/cli.rs
use std::path::PathBuf;

use clap::Parser;

// CLI entry point for the coordination API
#[derive(Parser, Debug)]
#[command(name = "medcoord-server")]
#[command(version = "0.1.0")]
#[command(about = "Healthcare coordination API server")]
pub struct CliArgs {
    /// Configuration file (TOML or YAML), layered under the environment
    #[arg(short = 'c', long = "config", value_name = "FILE", env = "MEDCOORD_CONFIG")]
    pub config: Option<PathBuf>,
    /// Listen address override
    #[arg(long = "host", value_name = "HOST")]
    pub host: Option<String>,
    /// Listen port override
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    pub port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_nothing_by_default() {
        let args = CliArgs::parse_from(["medcoord-server"]);
        assert!(args.host.is_none());
        assert!(args.port.is_none());
    }

    #[test]
    fn parses_port_and_config() {
        let args = CliArgs::parse_from(["medcoord-server", "-p", "8080", "--config", "app.toml"]);
        assert_eq!(args.port, Some(8080));
        assert_eq!(args.config, Some(PathBuf::from("app.toml")));
    }
}
