//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    completions::CompletionsArgs, list::ListArgs, run::RunArgs, show::ShowArgs,
    validate::ValidateArgs, wizard::WizardArgs,
};
use crate::core::Config;

#[derive(Parser)]
#[command(name = "fitforms")]
#[command(author, version, about = "Schema-driven forms and wizards for the fitting workbench")]
#[command(
    long_about = "Declarative YAML form definitions compiled into validators, interactive \
                  input collection, and multi-step wizard flows."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available schema documents
    List(ListArgs),

    /// Print a schema document
    Show(ShowArgs),

    /// Run a form and emit its payload
    Run(RunArgs),

    /// Run a multi-step wizard and emit the accumulated data
    Wizard(WizardArgs),

    /// Validate schema documents
    Validate(ValidateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Output format for payloads and listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Automatically pick (yaml for payloads, a table for lists)
    #[default]
    Auto,
    /// YAML
    Yaml,
    /// JSON
    Json,
    /// Tab-separated values (for piping)
    Tsv,
}

impl OutputFormat {
    /// Resolve `auto` through the configured default format.
    pub fn resolved(self, config: &Config) -> OutputFormat {
        if self != OutputFormat::Auto {
            return self;
        }
        match config.default_format.as_deref() {
            Some("json") => OutputFormat::Json,
            Some("yaml") => OutputFormat::Yaml,
            Some("tsv") => OutputFormat::Tsv,
            _ => OutputFormat::Auto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_format_resolution() {
        let config = Config {
            default_format: Some("json".into()),
            schema_dir: None,
        };
        assert_eq!(OutputFormat::Auto.resolved(&config), OutputFormat::Json);
        assert_eq!(OutputFormat::Yaml.resolved(&config), OutputFormat::Yaml);

        let empty = Config::default();
        assert_eq!(OutputFormat::Auto.resolved(&empty), OutputFormat::Auto);
    }
}
