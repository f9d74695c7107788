//! `fitforms show` - print a schema document

use miette::{IntoDiagnostic, Result};
use std::io::Write;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;
use crate::schema::{SchemaDocument, SchemaRegistry};

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Schema name or path
    pub schema: String,
}

pub fn run(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let registry = SchemaRegistry::with_search_dir(config.schema_dir.clone());
    let loaded = registry.resolve(&args.schema)?;

    match global.format.resolved(&config) {
        OutputFormat::Json => {
            let value = match &loaded.document {
                SchemaDocument::Form(form) => serde_json::to_value(form).into_diagnostic()?,
                SchemaDocument::Wizard(wizard) => {
                    serde_json::to_value(wizard).into_diagnostic()?
                }
            };
            println!("{}", serde_json::to_string_pretty(&value).into_diagnostic()?);
        }
        // The source text is already YAML, comments included.
        _ => std::io::stdout()
            .write_all(loaded.source.as_bytes())
            .into_diagnostic()?,
    }

    Ok(())
}
