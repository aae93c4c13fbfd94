//! Command-line interface definition
//!
//! Defines the CLI structure using clap's derive API, providing commands
//! for authorization, one-shot questions, and interactive chat.

use clap::{Parser, Subcommand};

/// Toolgate - multi-server tool gateway CLI
///
/// Authorize against an OAuth2 provider, discover tools across the
/// configured capability servers, and answer questions with them.
#[derive(Parser, Debug, Clone)]
#[command(name = "toolgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the browser authorization flow and store the bearer token
    Login,

    /// Answer a single question using the configured servers' tools
    Ask {
        /// The question to answer
        question: String,
    },

    /// Start an interactive chat session
    Chat,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_login() {
        let cli = Cli::try_parse_from(["toolgate", "login"]).unwrap();
        assert!(matches!(cli.command, Commands::Login));
        assert_eq!(cli.config, "config/config.yaml");
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parse_ask_with_question() {
        let cli = Cli::try_parse_from(["toolgate", "ask", "what is the weather in Oslo"]).unwrap();
        if let Commands::Ask { question } = cli.command {
            assert_eq!(question, "what is the weather in Oslo");
        } else {
            panic!("Expected Ask command");
        }
    }

    #[test]
    fn test_cli_parse_ask_requires_question() {
        let cli = Cli::try_parse_from(["toolgate", "ask"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_cli_parse_chat() {
        let cli = Cli::try_parse_from(["toolgate", "chat"]).unwrap();
        assert!(matches!(cli.command, Commands::Chat));
    }

    #[test]
    fn test_cli_parse_with_config_and_verbose() {
        let cli = Cli::try_parse_from(["toolgate", "--config", "custom.yaml", "-v", "chat"]).unwrap();
        assert_eq!(cli.config, "custom.yaml");
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_parse_missing_command() {
        assert!(Cli::try_parse_from(["toolgate"]).is_err());
    }

    #[test]
    fn test_cli_parse_invalid_command() {
        assert!(Cli::try_parse_from(["toolgate", "invalid"]).is_err());
    }
}
