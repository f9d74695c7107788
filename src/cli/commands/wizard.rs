//! `fitforms wizard` - run a multi-step wizard and emit the accumulator
//!
//! Interactive mode walks the steps with a navigation menu (Back/Skip/
//! Cancel where the schema allows them). With `--no-input` the steps are
//! fed from a `--values` map of step id to field values; optional steps
//! with no entry are skipped when the wizard allows it.

use console::style;
use dialoguer::{theme::ColorfulTheme, Select};
use miette::{miette, IntoDiagnostic, Result};
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::cli::helpers::{emit_value, load_values_file, parse_set_pair};
use crate::cli::{prompt, GlobalOpts};
use crate::core::Config;
use crate::form::FormSession;
use crate::schema::{SchemaDocument, SchemaRegistry};
use crate::wizard::{WizardController, WizardState};

#[derive(clap::Args, Debug)]
pub struct WizardArgs {
    /// Schema name or path to a *.wizard.yaml file
    pub schema: String,

    /// YAML/JSON file mapping step id to that step's field values
    #[arg(long)]
    pub values: Option<PathBuf>,

    /// Set one field value (repeatable)
    #[arg(long = "set", value_name = "STEP.FIELD=VALUE")]
    pub set: Vec<String>,

    /// Do not prompt; submit the supplied step values directly
    #[arg(long)]
    pub no_input: bool,

    /// Write the accumulated data to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Fill,
    Back,
    Skip,
    Cancel,
}

impl Action {
    fn label(&self) -> &'static str {
        match self {
            Action::Fill => "Fill in this step",
            Action::Back => "Back to the previous step",
            Action::Skip => "Skip this step",
            Action::Cancel => "Cancel the wizard",
        }
    }
}

pub fn run(args: WizardArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let registry = SchemaRegistry::with_search_dir(config.schema_dir.clone());
    let loaded = registry.resolve(&args.schema)?;

    let schema = match loaded.document {
        SchemaDocument::Wizard(wizard) => wizard,
        SchemaDocument::Form(_) => {
            return Err(miette!(
                "'{}' is a form; use `fitforms run {}`",
                args.schema,
                args.schema
            ));
        }
    };

    let step_values = gather_step_values(&args)?;
    let mut controller = WizardController::new(schema);

    if args.no_input {
        run_batch(&mut controller, &step_values)?;
    } else {
        run_interactive(&mut controller, &step_values, global)?;
    }

    match controller.state() {
        WizardState::Completed => {
            if !global.quiet && !args.no_input {
                println!();
                println!(
                    "{} {} complete",
                    style("✓").green(),
                    style(&controller.schema().title).bold()
                );
                println!();
            }
            let format = global.format.resolved(&config);
            emit_value(
                &Value::Object(controller.data().clone()),
                format,
                args.output.as_deref(),
            )
        }
        WizardState::Cancelled => {
            if !global.quiet {
                println!("{}", style("Cancelled, nothing saved.").dim());
            }
            Ok(())
        }
        WizardState::Step(_) => unreachable!("wizard loop exits only in a terminal state"),
    }
}

/// Merge the `--values` file with `--set step.field=value` pairs.
fn gather_step_values(args: &WizardArgs) -> Result<Map<String, Value>> {
    let mut values = match &args.values {
        Some(path) => load_values_file(path)?,
        None => Map::new(),
    };
    for pair in &args.set {
        let (path, value) = parse_set_pair(pair)?;
        let (step_id, field) = path
            .split_once('.')
            .ok_or_else(|| miette!("wizard --set takes STEP.FIELD=VALUE, got '{}'", pair))?;
        let entry = values
            .entry(step_id.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        let Some(step_map) = entry.as_object_mut() else {
            return Err(miette!("'{}' in --values is not a mapping", step_id));
        };
        step_map.insert(field.to_string(), value);
    }
    Ok(values)
}

/// Feed every step from the supplied values without prompting. Steps
/// with no entry are skipped when possible, otherwise submitted with
/// their schema defaults only.
fn run_batch(controller: &mut WizardController, step_values: &Map<String, Value>) -> Result<()> {
    while let WizardState::Step(index) = controller.state() {
        let step = controller.schema().steps[index].clone();

        let entry = step_values.get(&step.id);
        if entry.is_none() && controller.can_skip() {
            controller.skip();
            continue;
        }

        let seed = entry
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let mut session = FormSession::with_values(step.form.clone(), seed);
        match session.submit() {
            Some(payload) => {
                controller.submit_step(payload);
            }
            None => {
                for (name, message) in session.errors() {
                    eprintln!(
                        "{} {}.{}: {}",
                        style("✗").red(),
                        step.id,
                        style(name).bold(),
                        message
                    );
                }
                return Err(miette!(
                    "step '{}' failed validation: {} error(s)",
                    step.id,
                    session.errors().len()
                ));
            }
        }
    }
    Ok(())
}

fn run_interactive(
    controller: &mut WizardController,
    step_values: &Map<String, Value>,
    global: &GlobalOpts,
) -> Result<()> {
    let theme = ColorfulTheme::default();

    if !global.quiet {
        println!();
        println!(
            "{} {}",
            style("◆").cyan(),
            style(&controller.schema().title).bold()
        );
        if let Some(description) = &controller.schema().description {
            println!("  {}", style(description).dim());
        }
        println!("{}", style("─".repeat(50)).dim());
    }

    while let WizardState::Step(index) = controller.state() {
        let step = controller.schema().steps[index].clone();

        if !global.quiet {
            println!();
            print_step_list(controller);
            if controller.schema().show_progress {
                println!(
                    "  {}",
                    style(format!("{:.0}% complete", controller.progress_percent())).dim()
                );
            }
            println!();
            println!(
                "{} Step {}/{}: {}",
                style("▸").cyan(),
                index + 1,
                controller.step_count(),
                style(&step.title).bold()
            );
            if let Some(description) = &step.description {
                println!("  {}", style(description).dim());
            }
            println!();
        }

        match pick_action(controller, &theme)? {
            Action::Fill => {
                // Revisits prefill from what the step submitted last time;
                // a fresh step starts from the wizard's seeded values.
                let seed = controller
                    .step_data(&step.id)
                    .cloned()
                    .or_else(|| {
                        step_values
                            .get(&step.id)
                            .and_then(Value::as_object)
                            .cloned()
                    })
                    .unwrap_or_default();
                let mut session = FormSession::with_values(step.form.clone(), seed);
                let payload = prompt::fill_form(&mut session)?;
                controller.submit_step(payload);
            }
            Action::Back => {
                controller.back();
            }
            Action::Skip => {
                controller.skip();
            }
            Action::Cancel => {
                controller.cancel();
            }
        }
    }
    Ok(())
}

/// Offer navigation only when there is somewhere else to go; a plain
/// first step drops straight into its form.
fn pick_action(controller: &WizardController, theme: &ColorfulTheme) -> Result<Action> {
    let mut actions = vec![Action::Fill];
    if !controller.is_first_step() {
        actions.push(Action::Back);
    }
    if controller.can_skip() {
        actions.push(Action::Skip);
    }
    actions.push(Action::Cancel);

    if actions.len() == 2 {
        return Ok(Action::Fill);
    }

    let labels: Vec<&str> = actions.iter().map(Action::label).collect();
    let pick = Select::with_theme(theme)
        .items(&labels)
        .default(0)
        .interact()
        .into_diagnostic()?;
    Ok(actions[pick])
}

fn print_step_list(controller: &WizardController) {
    for (i, step) in controller.schema().steps.iter().enumerate() {
        let glyph = if controller.is_step_completed(i) {
            style("✓").green()
        } else if controller.current_step_index() == Some(i) {
            style("▸").cyan()
        } else {
            style("○").dim()
        };
        println!("  {} {}", glyph, step.title);
    }
}
