//! `fitforms run` - run one form and emit its payload

use console::style;
use miette::{miette, Result};
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::cli::helpers::{emit_value, load_values_file, parse_set_pair};
use crate::cli::{prompt, GlobalOpts};
use crate::core::Config;
use crate::form::FormSession;
use crate::schema::{SchemaDocument, SchemaRegistry};

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Schema name or path to a *.form.yaml file
    pub schema: String,

    /// YAML/JSON file with initial field values
    #[arg(long)]
    pub values: Option<PathBuf>,

    /// Set one field value (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub set: Vec<String>,

    /// Do not prompt; submit the supplied values directly
    #[arg(long)]
    pub no_input: bool,

    /// Write the payload to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: RunArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let registry = SchemaRegistry::with_search_dir(config.schema_dir.clone());
    let loaded = registry.resolve(&args.schema)?;

    let form = match loaded.document {
        SchemaDocument::Form(form) => form,
        SchemaDocument::Wizard(_) => {
            return Err(miette!(
                "'{}' is a wizard; use `fitforms wizard {}`",
                args.schema,
                args.schema
            ));
        }
    };

    let initial = gather_initial(&args)?;
    let mut session = FormSession::with_values(form, initial);

    let payload = if args.no_input {
        submit_or_report(&mut session)?
    } else {
        print_header(&session, global);
        prompt::fill_form(&mut session)?
    };

    if !global.quiet && !args.no_input {
        let label = session
            .schema()
            .submit_label
            .as_deref()
            .unwrap_or("Submitted");
        println!();
        println!("{} {}", style("✓").green(), label);
        println!();
    }

    let format = global.format.resolved(&config);
    emit_value(&Value::Object(payload), format, args.output.as_deref())
}

/// Merge `--values` file entries with `--set` pairs, later winning.
fn gather_initial(args: &RunArgs) -> Result<Map<String, Value>> {
    let mut initial = match &args.values {
        Some(path) => load_values_file(path)?,
        None => Map::new(),
    };
    for pair in &args.set {
        let (name, value) = parse_set_pair(pair)?;
        initial.insert(name, value);
    }
    Ok(initial)
}

/// One-shot submit for `--no-input`: validation failures list every
/// field/message pair and exit non-zero.
fn submit_or_report(session: &mut FormSession) -> Result<Map<String, Value>> {
    match session.submit() {
        Some(payload) => Ok(payload),
        None => {
            for (name, message) in session.errors() {
                eprintln!("{} {}: {}", style("✗").red(), style(name).bold(), message);
            }
            Err(miette!(
                "validation failed: {} error(s)",
                session.errors().len()
            ))
        }
    }
}

fn print_header(session: &FormSession, global: &GlobalOpts) {
    if global.quiet {
        return;
    }
    let schema = session.schema();
    println!();
    println!("{} {}", style("◆").cyan(), style(&schema.title).bold());
    if let Some(description) = &schema.description {
        println!("  {}", style(description).dim());
    }
    println!("{}", style("─".repeat(50)).dim());
    println!();
}
