//! `fitforms list` - list available schema documents

use clap::ValueEnum;
use console::style;
use miette::Result;
use serde_json::json;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::emit_value;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;
use crate::schema::{SchemaKind, SchemaRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindFilter {
    Form,
    Wizard,
}

impl KindFilter {
    fn matches(&self, kind: SchemaKind) -> bool {
        matches!(
            (self, kind),
            (KindFilter::Form, SchemaKind::Form) | (KindFilter::Wizard, SchemaKind::Wizard)
        )
    }
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Restrict the listing to one document kind
    #[arg(long, value_enum)]
    pub kind: Option<KindFilter>,
}

pub fn run(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let registry = SchemaRegistry::with_search_dir(config.schema_dir.clone());

    let entries: Vec<_> = registry
        .entries()
        .into_iter()
        .filter(|e| args.kind.map_or(true, |k| k.matches(e.kind)))
        .collect();

    match global.format.resolved(&config) {
        OutputFormat::Tsv => {
            for entry in &entries {
                println!("{}\t{}\t{}", entry.name, entry.kind, entry.origin);
            }
        }
        format @ (OutputFormat::Json | OutputFormat::Yaml) => {
            let listing: Vec<_> = entries
                .iter()
                .map(|e| {
                    json!({
                        "name": e.name,
                        "kind": e.kind.as_str(),
                        "origin": e.origin,
                    })
                })
                .collect();
            emit_value(&json!(listing), format, None)?;
        }
        OutputFormat::Auto => {
            if entries.is_empty() {
                println!("No schemas found");
                return Ok(());
            }

            let mut builder = Builder::default();
            builder.push_record(["NAME", "KIND", "ORIGIN"]);
            for entry in &entries {
                builder.push_record([
                    entry.name.as_str(),
                    entry.kind.as_str(),
                    entry.origin.as_str(),
                ]);
            }
            let mut table = builder.build();
            table.with(Style::sharp());
            println!("{}", table);

            if !global.quiet {
                println!();
                println!("{} {} schema(s)", style("→").blue(), entries.len());
            }
        }
    }

    Ok(())
}
