//! Declarative form and wizard schema types
//!
//! Every form in the workbench is described by one of these documents,
//! usually loaded from a `*.form.yaml` or `*.wizard.yaml` file. The types
//! mirror the document shape one-to-one; camelCase keys on the wire.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed set of input types a field can declare.
///
/// The set is deliberately a tagged union rather than a free-form string:
/// every consumer matches on it exhaustively, so adding a variant forces
/// each dispatch site to decide how to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Email,
    Password,
    Select,
    Checkbox,
    Radio,
    Textarea,
    File,
    Range,
    Date,
    Array,
    Object,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Email => "email",
            FieldType::Password => "password",
            FieldType::Select => "select",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::Textarea => "textarea",
            FieldType::File => "file",
            FieldType::Range => "range",
            FieldType::Date => "date",
            FieldType::Array => "array",
            FieldType::Object => "object",
        };
        write!(f, "{}", s)
    }
}

/// Validation rule kinds.
///
/// `custom` is accepted by the data model but never compiled; the document
/// validator flags it so authors know the rule is inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleType {
    Required,
    Min,
    Max,
    MinLength,
    MaxLength,
    Pattern,
    Custom,
}

/// One validation rule attached to a field.
///
/// Rules apply only to type-compatible fields; a numeric rule on a text
/// field is skipped at compile time rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(rename = "type")]
    pub rule_type: RuleType,

    /// Rule argument (bound, length, or pattern source). Absent for `required`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Message surfaced next to the field when the rule fails.
    pub message: String,
}

/// An option of a `select` or `radio` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectOption {
    /// Stored value (string or number scalar).
    pub value: Value,
    /// Human-readable label.
    pub label: String,
}

/// Visibility rule: the field is shown only while the referenced field's
/// current value equals `value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalRule {
    pub field: String,
    pub value: Value,
}

/// Description of a single form input and its constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    /// Unique key within the form.
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<ValidationRule>,

    /// Choices for select/radio fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,

    /// Renderer hints for number/range widgets. Not validated against;
    /// use `min`/`max` rules for enforcement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,

    /// Accepted file extensions for file fields (e.g. ".gr,.chi").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,

    /// Multiple selection for file/select fields.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub multiple: bool,

    /// Display height for textarea widgets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,

    /// Nested fields for object-typed inputs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldSchema>,

    /// Element schema for array-typed inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_schema: Option<Box<FieldSchema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<ConditionalRule>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
}

impl FieldSchema {
    /// Whether the field carries a `required` validation rule.
    pub fn is_required(&self) -> bool {
        self.validation
            .iter()
            .any(|r| r.rule_type == RuleType::Required)
    }

    /// Find the first rule of the given kind.
    pub fn rule(&self, kind: RuleType) -> Option<&ValidationRule> {
        self.validation.iter().find(|r| r.rule_type == kind)
    }
}

/// A complete form definition: ordered fields with unique names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    pub id: String,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub fields: Vec<FieldSchema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_label: Option<String>,
}

impl FormSchema {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One step of a wizard: a form plus flow metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardStepSchema {
    pub id: String,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub form: FormSchema,

    /// Optional steps may be skipped when the wizard allows it.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

/// A multi-step wizard definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSchema {
    pub id: String,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub steps: Vec<WizardStepSchema>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_skip: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub show_progress: bool,
}

impl WizardSchema {
    pub fn step(&self, id: &str) -> Option<&WizardStepSchema> {
        self.steps.iter().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_wire_names() {
        let ty: FieldType = serde_yml::from_str("textarea").unwrap();
        assert_eq!(ty, FieldType::Textarea);
        assert_eq!(serde_json::to_value(FieldType::Range).unwrap(), "range");
    }

    #[test]
    fn test_rule_type_camel_case() {
        let rt: RuleType = serde_yml::from_str("minLength").unwrap();
        assert_eq!(rt, RuleType::MinLength);
    }

    #[test]
    fn test_unknown_field_type_is_rejected() {
        let result: Result<FieldType, _> = serde_yml::from_str("slider");
        assert!(result.is_err(), "unknown type tags must not parse");
    }

    #[test]
    fn test_form_schema_roundtrip() {
        let yaml = r#"
id: dataset
title: Dataset
fields:
  - name: qmax
    type: number
    label: "Qmax"
    defaultValue: 25.0
    validation:
      - type: required
        message: "Qmax is required"
      - type: min
        value: 0
        message: "Qmax must be positive"
  - name: stype
    type: select
    label: "Radiation"
    options:
      - value: X
        label: "X-ray"
      - value: N
        label: "Neutron"
"#;
        let form: FormSchema = serde_yml::from_str(yaml).unwrap();
        assert_eq!(form.fields.len(), 2);
        assert!(form.field("qmax").unwrap().is_required());
        assert_eq!(form.field("stype").unwrap().options.len(), 2);
        assert!(form.field("nope").is_none());
    }

    #[test]
    fn test_conditional_parses() {
        let yaml = r#"
name: rstep
type: number
label: "r step"
conditional:
  field: sampling
  value: custom
"#;
        let field: FieldSchema = serde_yml::from_str(yaml).unwrap();
        let cond = field.conditional.unwrap();
        assert_eq!(cond.field, "sampling");
        assert_eq!(cond.value, Value::String("custom".into()));
    }
}
