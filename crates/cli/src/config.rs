//! Command-line configuration.

use crate::commands::Command;
use clap::{ArgAction, Parser};
use tracing::Level;

/// Endpoint used by both the server and the client unless overridden.
pub const DEFAULT_ENDPOINT: &str = "127.0.0.1:10000";

#[derive(Debug, Parser)]
#[command(name = "remote-tree", version, about = "Host and browse a remote file tree")]
pub struct CliConfig {
    /// Address the server listens on and the client connects to.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT, global = true)]
    pub endpoint: String,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    /// Installs the global log subscriber. Logs go to stderr so command
    /// output on stdout stays clean.
    pub fn init_logging(&self) {
        tracing_subscriber::fmt()
            .with_max_level(self.log_level())
            .with_writer(std::io::stderr)
            .init();
    }

    pub async fn run(self) -> anyhow::Result<()> {
        self.init_logging();
        let result = self.command.execute(&self.endpoint).await?;
        print!("{}", result);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::Identity;

    #[test]
    fn test_defaults() {
        let config = CliConfig::parse_from(["remote-tree", "ls"]);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.log_level(), Level::INFO);
        assert!(matches!(
            config.command,
            Command::Ls { ref root, long: false } if root.is_root()
        ));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let config = CliConfig::parse_from([
            "remote-tree",
            "cat",
            "abc",
            "-e",
            "10.0.0.1:4000",
            "-vv",
        ]);
        assert_eq!(config.endpoint, "10.0.0.1:4000");
        assert_eq!(config.log_level(), Level::TRACE);
        assert!(matches!(
            config.command,
            Command::Cat { ref identity } if *identity == Identity::new("abc", "")
        ));
    }

    #[test]
    fn test_write_collects_lines() {
        let config = CliConfig::parse_from(["remote-tree", "write", "abc", "one", "two"]);
        match config.command {
            Command::Write { identity, lines } => {
                assert_eq!(identity.name, "abc");
                assert_eq!(lines, vec!["one".to_string(), "two".to_string()]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
