//! Command-line interface.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::analysis::PromptTemplate;
use crate::config::Config;

#[derive(Parser)]
#[command(name = "sovereign")]
#[command(about = "Freelancer back office with AI document analysis")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and database schema
    Init,

    /// Start the HTTP API server
    Serve {
        /// Bind address: port, host, or host:port (default from config or 127.0.0.1:3030)
        bind: Option<String>,
    },

    /// Run one analysis over a local document and print the JSON result
    Analyze {
        /// PDF, Word (.docx) or plain text file
        file: PathBuf,
        /// Prompt template to run
        #[arg(short, long, default_value = "contract_risk", value_parser = parse_template)]
        template: PromptTemplate,
        /// Content type (detected from the file when omitted)
        #[arg(long)]
        mime: Option<String>,
        /// Extra template variable as name=value (e.g. tone=friendly)
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, String)>,
    },

    /// Report extraction tools and model configuration
    Check,
}

fn parse_template(s: &str) -> Result<PromptTemplate, String> {
    PromptTemplate::from_str(s).ok_or_else(|| {
        let names: Vec<&str> = PromptTemplate::all().iter().map(|t| t.as_str()).collect();
        format!("unknown template '{}' (expected one of: {})", s, names.join(", "))
    })
}

fn parse_var(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .filter(|(name, _)| !name.trim().is_empty())
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{}'", s))
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())
        .await
        .map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Init => commands::init::cmd_init(&config).await,
        Commands::Serve { bind } => commands::serve::cmd_serve(&config, bind.as_deref()).await,
        Commands::Analyze {
            file,
            template,
            mime,
            vars,
        } => commands::analyze::cmd_analyze(&config, &file, template, mime.as_deref(), vars).await,
        Commands::Check => commands::check::cmd_check(&config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze_args() {
        let cli = Cli::try_parse_from([
            "sovereign",
            "analyze",
            "deal.pdf",
            "--template",
            "negotiation-email",
            "--var",
            "tone=warm",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze { template, vars, .. } => {
                assert_eq!(template, PromptTemplate::NegotiationEmail);
                assert_eq!(vars, vec![("tone".to_string(), "warm".to_string())]);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_rejects_unknown_template() {
        assert!(Cli::try_parse_from(["sovereign", "analyze", "a.txt", "-t", "poetry"]).is_err());
        assert!(parse_var("novalue").is_err());
    }
}
