//! CLI module for A.R.E.S Research
//!
//! Provides command-line interface parsing for the ares-research binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// A.R.E.S Research - research planning and agent dispatch
#[derive(Parser, Debug)]
#[command(
    name = "ares-research",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "A.R.E.S Research - research planning and agent-to-agent dispatch",
    long_about = "A.R.E.S Research - builds dependency-ordered research plans, groups their\n\
                  steps for parallel execution, and dispatches them to remote specialist agents.",
    after_help = "EXAMPLES:\n    \
                  ares-research plan request.json             # Print a research plan\n    \
                  ares-research plan request.json --json      # Print the plan as JSON\n    \
                  ares-research plan request.json --execute   # Plan and dispatch to agents\n    \
                  ares-research route message.json            # Route one A2A message\n    \
                  ares-research validate-config               # Check ares-research.toml"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(
        short,
        long,
        default_value = DEFAULT_CONFIG_PATH,
        env = "ARES_RESEARCH_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Default configuration file name
pub const DEFAULT_CONFIG_PATH: &str = "ares-research.toml";

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a research plan from a JSON request file
    Plan {
        /// Path to the plan request (topic, methodology, depth, dimensions)
        request: PathBuf,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,

        /// Dispatch the plan's groups to the configured agents
        #[arg(long)]
        execute: bool,
    },

    /// Route a single A2A message read from a JSON file
    Route {
        /// Path to the message
        message: PathBuf,
    },

    /// Validate the configuration file
    ValidateConfig,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_help_names_the_tool() {
        let mut command = Cli::command();
        let short = command.render_help().to_string();
        let long = command.render_long_help().to_string();

        assert!(short.contains("A.R.E.S Research"));
        assert!(long.contains("A.R.E.S Research"));
        assert!(long.contains("validate-config"));
    }

    #[test]
    fn test_parse_plan() {
        let cli = Cli::try_parse_from(["ares-research", "plan", "req.json", "--json"]).unwrap();

        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        match cli.command {
            Commands::Plan {
                request,
                json,
                execute,
            } => {
                assert_eq!(request, PathBuf::from("req.json"));
                assert!(json);
                assert!(!execute);
            }
            other => panic!("Expected plan command, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ares-research",
            "validate-config",
            "--config",
            "custom.toml",
            "--no-color",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert!(cli.no_color);
        assert!(matches!(cli.command, Commands::ValidateConfig));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["ares-research"]).is_err());
    }
}
