//! Node configuration from command-line flags with environment fallbacks.

use clap::builder::TypedValueParser;
use clap::Parser;
use std::net::SocketAddr;

use crate::pow::DEFAULT_DIFFICULTY;

/// Highest difficulty accepted from configuration.
pub const MAX_DIFFICULTY: usize = 6;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Claim-score ledger node", long_about = None)]
pub struct NodeConfig {
    /// Host to bind the HTTP listener on.
    #[arg(long, env = "LEDGER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the HTTP listener on.
    #[arg(short, long, env = "LEDGER_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Leading zero hex characters required of every block hash.
    #[arg(
        long,
        env = "LEDGER_DIFFICULTY",
        default_value_t = DEFAULT_DIFFICULTY,
        value_parser = clap::value_parser!(u64).range(1..=MAX_DIFFICULTY as u64).map(|d| d as usize)
    )]
    pub difficulty: usize,
}

impl NodeConfig {
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = NodeConfig::try_parse_from(["claim-ledger-node"]).unwrap();
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.difficulty, DEFAULT_DIFFICULTY);
        assert_eq!(cfg.addr().unwrap(), "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = NodeConfig::try_parse_from([
            "claim-ledger-node",
            "--host",
            "0.0.0.0",
            "-p",
            "8080",
            "--difficulty",
            "2",
        ])
        .unwrap();
        assert_eq!(cfg.difficulty, 2);
        assert_eq!(cfg.addr().unwrap().port(), 8080);
    }

    #[test]
    fn difficulty_out_of_range_is_rejected() {
        assert!(NodeConfig::try_parse_from(["claim-ledger-node", "--difficulty", "0"]).is_err());
        assert!(NodeConfig::try_parse_from(["claim-ledger-node", "--difficulty", "7"]).is_err());
    }
}
