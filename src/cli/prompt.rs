//! Interactive form renderer
//!
//! Collects values for the visible fields of a [`FormSession`] through
//! dialoguer prompts, one widget kind per field type. Visibility is
//! re-evaluated after every collected value, so answering a watched
//! field immediately reveals or hides its dependents. After a failed
//! submit only the offending fields are prompted again, with their
//! validation messages inline.

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect, Password, Select};
use miette::{IntoDiagnostic, Result};
use serde_json::{Map, Number, Value};

use crate::form::FormSession;
use crate::schema::forms::{FieldSchema, FieldType};

/// Run the full collect-submit loop for one session. Returns the
/// validated payload; prompting continues until validation passes or the
/// user aborts the terminal interaction.
pub fn fill_form(session: &mut FormSession) -> Result<Map<String, Value>> {
    let theme = ColorfulTheme::default();
    let names: Vec<String> = session
        .schema()
        .fields
        .iter()
        .map(|f| f.name.clone())
        .collect();

    for name in &names {
        collect_field(session, &theme, name, None)?;
    }

    loop {
        if let Some(payload) = session.submit() {
            return Ok(payload);
        }

        let failing: Vec<(String, String)> = session
            .errors()
            .iter()
            .map(|(name, message)| (name.clone(), message.clone()))
            .collect();

        println!();
        println!(
            "{} {} field(s) need attention",
            style("✗").red(),
            failing.len()
        );

        for (name, message) in &failing {
            collect_field(session, &theme, name, Some(message))?;
        }
    }
}

/// Prompt one field if it is currently visible and store the value.
fn collect_field(
    session: &mut FormSession,
    theme: &ColorfulTheme,
    name: &str,
    error: Option<&str>,
) -> Result<()> {
    if session.is_hidden(name) {
        return Ok(());
    }
    let Some(field) = session.schema().field(name).cloned() else {
        return Ok(());
    };

    if field.disabled || field.read_only {
        let shown = session
            .value(name)
            .map(render_scalar)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {} {} {}",
            style(&field.label).bold(),
            style(shown).dim(),
            style("(read-only)").dim()
        );
        return Ok(());
    }

    if let Some(message) = error {
        println!("  {} {}", style("✗").red(), style(message).red());
    }

    let current = session.value(name).cloned();
    if let Some(value) = prompt_field(theme, &field, current.as_ref())? {
        session.set_value(name, value);
    }
    Ok(())
}

/// Prompt for a single value. `None` means the user left an optional
/// field empty.
fn prompt_field(
    theme: &ColorfulTheme,
    field: &FieldSchema,
    current: Option<&Value>,
) -> Result<Option<Value>> {
    let prompt = format_prompt(field);

    match field.field_type {
        FieldType::Select | FieldType::Radio => prompt_select(theme, field, &prompt, current),

        FieldType::Checkbox => {
            let default = current.and_then(Value::as_bool).unwrap_or(false);
            let answer = Confirm::with_theme(theme)
                .with_prompt(&prompt)
                .default(default)
                .interact()
                .into_diagnostic()?;
            Ok(Some(Value::Bool(answer)))
        }

        FieldType::Number | FieldType::Range => prompt_number(theme, field, &prompt, current),

        FieldType::Password => {
            let secret = Password::with_theme(theme)
                .with_prompt(&prompt)
                .allow_empty_password(!field.is_required())
                .interact()
                .into_diagnostic()?;
            if secret.is_empty() {
                Ok(None)
            } else {
                Ok(Some(Value::String(secret)))
            }
        }

        FieldType::File => {
            let hint = field
                .accept
                .as_deref()
                .map(|a| format!("{} ({})", prompt, style(a).dim()))
                .unwrap_or(prompt);
            prompt_text(theme, field, &hint, current)
        }

        FieldType::Array => prompt_array(theme, field, &prompt, current),

        FieldType::Text
        | FieldType::Email
        | FieldType::Textarea
        | FieldType::Date
        | FieldType::Object => prompt_text(theme, field, &prompt, current),
    }
}

fn prompt_text(
    theme: &ColorfulTheme,
    field: &FieldSchema,
    prompt: &str,
    current: Option<&Value>,
) -> Result<Option<Value>> {
    let mut input = Input::<String>::with_theme(theme)
        .with_prompt(prompt)
        .allow_empty(!field.is_required());
    if let Some(existing) = current.map(render_scalar).filter(|s| !s.is_empty()) {
        input = input.default(existing);
    }
    let value = input.interact_text().into_diagnostic()?;
    if value.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Value::String(value)))
    }
}

fn prompt_number(
    theme: &ColorfulTheme,
    field: &FieldSchema,
    prompt: &str,
    current: Option<&Value>,
) -> Result<Option<Value>> {
    loop {
        let mut input = Input::<String>::with_theme(theme)
            .with_prompt(prompt)
            .allow_empty(!field.is_required());
        if let Some(existing) = current.map(render_scalar).filter(|s| !s.is_empty()) {
            input = input.default(existing);
        }
        let raw = input.interact_text().into_diagnostic()?;
        if raw.is_empty() {
            return Ok(None);
        }
        match raw.trim().parse::<f64>().ok().and_then(Number::from_f64) {
            Some(n) => return Ok(Some(Value::Number(n))),
            None => println!("  {} not a number: '{}'", style("✗").red(), raw),
        }
    }
}

fn prompt_select(
    theme: &ColorfulTheme,
    field: &FieldSchema,
    prompt: &str,
    current: Option<&Value>,
) -> Result<Option<Value>> {
    if field.options.is_empty() {
        // Nothing to choose from; treated as free text.
        return prompt_text(theme, field, prompt, current);
    }

    if field.multiple {
        let labels: Vec<&str> = field.options.iter().map(|o| o.label.as_str()).collect();
        let preselected: Vec<bool> = field
            .options
            .iter()
            .map(|o| {
                current
                    .and_then(Value::as_array)
                    .is_some_and(|chosen| chosen.contains(&o.value))
            })
            .collect();
        let picks = MultiSelect::with_theme(theme)
            .with_prompt(prompt)
            .items(&labels)
            .defaults(&preselected)
            .interact()
            .into_diagnostic()?;
        let values: Vec<Value> = picks
            .into_iter()
            .map(|i| field.options[i].value.clone())
            .collect();
        if values.is_empty() && !field.is_required() {
            return Ok(None);
        }
        return Ok(Some(Value::Array(values)));
    }

    let mut labels: Vec<String> = Vec::new();
    // Optional selects get an explicit no-choice entry up front.
    let optional_sentinel = !field.is_required();
    if optional_sentinel {
        labels.push("Select...".to_string());
    }
    labels.extend(field.options.iter().map(|o| o.label.clone()));

    let offset = usize::from(optional_sentinel);
    let default_idx = current
        .and_then(|v| field.options.iter().position(|o| &o.value == v))
        .map(|i| i + offset)
        .unwrap_or(0);

    let pick = Select::with_theme(theme)
        .with_prompt(prompt)
        .items(&labels)
        .default(default_idx)
        .interact()
        .into_diagnostic()?;

    if optional_sentinel && pick == 0 {
        return Ok(None);
    }
    Ok(Some(field.options[pick - offset].value.clone()))
}

fn prompt_array(
    theme: &ColorfulTheme,
    field: &FieldSchema,
    prompt: &str,
    current: Option<&Value>,
) -> Result<Option<Value>> {
    if !field.options.is_empty() {
        return prompt_select(theme, field, prompt, current);
    }
    let existing = current
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(render_scalar)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();
    let mut input = Input::<String>::with_theme(theme)
        .with_prompt(format!("{} (comma-separated)", prompt))
        .allow_empty(!field.is_required());
    if !existing.is_empty() {
        input = input.default(existing);
    }
    let raw = input.interact_text().into_diagnostic()?;
    if raw.is_empty() {
        return Ok(None);
    }
    let items: Vec<Value> = raw
        .split(',')
        .map(|s| Value::String(s.trim().to_string()))
        .collect();
    Ok(Some(Value::Array(items)))
}

/// Label, required marker, dim description or placeholder.
fn format_prompt(field: &FieldSchema) -> String {
    let mut prompt = field.label.clone();
    if field.is_required() {
        prompt.push_str(" *");
    }
    let hint = field
        .description
        .as_deref()
        .or(field.placeholder.as_deref());
    if let Some(hint) = hint {
        let short = crate::cli::helpers::truncate_str(hint, 50);
        prompt = format!("{} ({})", prompt, style(short).dim());
    }
    prompt
}

/// A scalar rendered the way it should round-trip through an input box.
pub fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(yaml: &str) -> FieldSchema {
        serde_yml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_format_prompt_marks_required() {
        let f = field(
            r#"
name: name
type: text
label: Project name
validation:
  - type: required
    message: required
"#,
        );
        assert!(format_prompt(&f).starts_with("Project name *"));
    }

    #[test]
    fn test_format_prompt_prefers_description_over_placeholder() {
        let f = field(
            r#"
name: qmax
type: number
label: Qmax
description: Momentum transfer cutoff
placeholder: "25.0"
"#,
        );
        let prompt = format_prompt(&f);
        assert!(prompt.contains("Momentum transfer cutoff"));
        assert!(!prompt.contains("25.0"));
    }

    #[test]
    fn test_render_scalar_strings_are_bare() {
        assert_eq!(render_scalar(&json!("X")), "X");
        assert_eq!(render_scalar(&json!(25.5)), "25.5");
        assert_eq!(render_scalar(&json!(true)), "true");
    }
}
