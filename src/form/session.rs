//! Form session - one live instance of a form schema
//!
//! Holds the current value map, the per-field error messages from the
//! last submit attempt, and the set of fields hidden by conditional
//! rules. Visibility is recomputed from the live values on every change;
//! it is never cached against the schema alone.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::form::compiler::{compile, CompiledForm};
use crate::schema::forms::{FieldSchema, FormSchema};

/// Pure visibility function: which fields are hidden under the current
/// values. A field is hidden iff it declares a conditional and the
/// referenced field's current value does not equal the target. An absent
/// value equals nothing, JSON null included.
pub fn hidden_fields(schema: &FormSchema, values: &Map<String, Value>) -> BTreeSet<String> {
    let mut hidden = BTreeSet::new();
    for field in &schema.fields {
        if let Some(cond) = &field.conditional {
            let visible = values.get(&cond.field) == Some(&cond.value);
            if !visible {
                hidden.insert(field.name.clone());
            }
        }
    }
    hidden
}

/// Live, mutable state for one bound form schema.
pub struct FormSession {
    schema: FormSchema,
    compiled: CompiledForm,
    values: Map<String, Value>,
    errors: BTreeMap<String, String>,
    hidden: BTreeSet<String>,
}

impl FormSession {
    /// Bind a schema with its declared defaults as initial values.
    pub fn new(schema: FormSchema) -> Self {
        Self::with_values(schema, Map::new())
    }

    /// Bind a schema with caller-supplied initial values layered over the
    /// schema defaults. The merge happens once, here.
    pub fn with_values(schema: FormSchema, initial: Map<String, Value>) -> Self {
        let compiled = compile(&schema.fields);
        let mut values = compiled.defaults();
        for (name, value) in initial {
            values.insert(name, value);
        }
        let hidden = hidden_fields(&schema, &values);
        FormSession {
            schema,
            compiled,
            values,
            errors: BTreeMap::new(),
            hidden,
        }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Errors from the last failed submit, field name to message.
    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    pub fn is_hidden(&self, name: &str) -> bool {
        self.hidden.contains(name)
    }

    /// Fields currently visible, in schema order.
    pub fn visible_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.schema
            .fields
            .iter()
            .filter(|f| !self.hidden.contains(&f.name))
    }

    /// Store a value and recompute visibility. Hidden fields keep their
    /// stored values; they are only excluded from rendering, validation,
    /// and the payload.
    pub fn set_value(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
        self.hidden = hidden_fields(&self.schema, &self.values);
    }

    /// Validate the visible fields and produce the submission payload.
    ///
    /// On success the error map clears and the payload holds the visible
    /// fields' current values in schema order. On failure the error map is
    /// replaced and `None` is returned. Hidden fields never validate and
    /// never appear in the payload, a `required` rule notwithstanding.
    pub fn submit(&mut self) -> Option<Map<String, Value>> {
        let verdict = self
            .compiled
            .validate_filtered(&self.values, |name| !self.hidden.contains(name));

        if !verdict.valid {
            self.errors = verdict.errors;
            return None;
        }

        self.errors.clear();
        let mut payload = Map::new();
        for field in &self.schema.fields {
            if self.hidden.contains(&field.name) {
                continue;
            }
            if let Some(value) = self.values.get(&field.name) {
                payload.insert(field.name.clone(), value.clone());
            }
        }
        Some(payload)
    }

    /// Replace the value map wholesale, recompute visibility, clear errors.
    pub fn reset(&mut self, values: Map<String, Value>) {
        self.values = values;
        self.hidden = hidden_fields(&self.schema, &self.values);
        self.errors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(yaml: &str) -> FormSchema {
        serde_yml::from_str(yaml).unwrap()
    }

    fn conditional_schema() -> FormSchema {
        schema(
            r#"
id: corrections
title: Corrections
fields:
  - name: a
    type: select
    label: Apply
    options:
      - value: "yes"
        label: "Yes"
      - value: "no"
        label: "No"
  - name: b
    type: number
    label: Correction value
    conditional:
      field: a
      value: "yes"
    validation:
      - type: required
        message: "value required"
"#,
        )
    }

    #[test]
    fn test_initial_values_defaults_then_overrides() {
        let s = schema(
            r#"
id: range
title: Range
fields:
  - name: rmin
    type: number
    label: rmin
    defaultValue: 0.01
  - name: rmax
    type: number
    label: rmax
    defaultValue: 10.0
"#,
        );
        let initial = json!({ "rmax": 20.0 }).as_object().unwrap().clone();
        let session = FormSession::with_values(s, initial);
        assert_eq!(session.value("rmin"), Some(&json!(0.01)));
        assert_eq!(session.value("rmax"), Some(&json!(20.0)));
    }

    #[test]
    fn test_hidden_field_skips_validation_and_payload() {
        // Scenario E: b is required but conditional on a == "yes".
        let mut session = FormSession::new(conditional_schema());
        session.set_value("a", json!("no"));
        assert!(session.is_hidden("b"));

        let payload = session.submit().expect("hidden required field is exempt");
        assert!(!payload.contains_key("b"));
        assert!(session.errors().is_empty());
    }

    #[test]
    fn test_visible_conditional_field_validates() {
        let mut session = FormSession::new(conditional_schema());
        session.set_value("a", json!("yes"));
        assert!(!session.is_hidden("b"));

        assert!(session.submit().is_none());
        assert_eq!(session.error("b"), Some("value required"));

        session.set_value("b", json!(1.5));
        let payload = session.submit().expect("valid after filling b");
        assert_eq!(payload["b"], json!(1.5));
    }

    #[test]
    fn test_hidden_field_retains_value() {
        let mut session = FormSession::new(conditional_schema());
        session.set_value("a", json!("yes"));
        session.set_value("b", json!(2.0));
        session.set_value("a", json!("no"));

        // Still stored, just not rendered or submitted.
        assert_eq!(session.value("b"), Some(&json!(2.0)));
        let payload = session.submit().unwrap();
        assert!(!payload.contains_key("b"));

        session.set_value("a", json!("yes"));
        let payload = session.submit().unwrap();
        assert_eq!(payload["b"], json!(2.0));
    }

    #[test]
    fn test_conditional_on_absent_value_hides() {
        let session = FormSession::new(conditional_schema());
        assert!(session.is_hidden("b"));
    }

    #[test]
    fn test_submit_failure_sets_errors_and_success_clears() {
        // Scenario A.
        let s = schema(
            r#"
id: project
title: Project
fields:
  - name: name
    type: text
    label: Name
    validation:
      - type: required
        message: "Project name is required"
"#,
        );
        let mut session = FormSession::new(s);
        session.set_value("name", json!(""));
        assert!(session.submit().is_none());
        assert_eq!(session.error("name"), Some("Project name is required"));

        session.set_value("name", json!("nickel"));
        let payload = session.submit().unwrap();
        assert_eq!(payload["name"], json!("nickel"));
        assert!(session.errors().is_empty());
    }

    #[test]
    fn test_payload_excludes_unknown_keys() {
        let s = schema(
            r#"
id: project
title: Project
fields:
  - name: name
    type: text
    label: Name
"#,
        );
        let initial = json!({ "name": "x", "stray": 1 }).as_object().unwrap().clone();
        let mut session = FormSession::with_values(s, initial);
        let payload = session.submit().unwrap();
        assert_eq!(payload.len(), 1);
        assert!(payload.contains_key("name"));
    }

    #[test]
    fn test_reset_replaces_wholesale_and_clears_errors() {
        let mut session = FormSession::new(conditional_schema());
        session.set_value("a", json!("yes"));
        session.submit();
        assert!(!session.errors().is_empty());

        session.reset(Map::new());
        assert!(session.errors().is_empty());
        assert!(session.value("a").is_none());
        assert!(session.is_hidden("b"));
    }

    #[test]
    fn test_visible_fields_in_schema_order() {
        let mut session = FormSession::new(conditional_schema());
        session.set_value("a", json!("yes"));
        let names: Vec<&str> = session.visible_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
