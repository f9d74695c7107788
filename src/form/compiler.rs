//! Schema compiler - turns a field list into a runtime validator
//!
//! `compile` never fails and the resulting [`CompiledForm`] never panics:
//! rules that don't fit their field's base type are dropped during
//! compilation, and `validate` always returns a structured error map.

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::schema::forms::{FieldSchema, FieldType, RuleType};

/// Practical email shape: one `@`, a dot somewhere in the domain part.
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// Base value predicate derived from a field's type.
#[derive(Debug)]
enum BasePredicate {
    /// number, range
    Numeric,
    /// checkbox
    Boolean,
    /// email: string shape plus email pattern
    EmailShape(Regex),
    /// file: values pass through unchecked
    Opaque,
    /// array
    Sequence,
    /// everything else collects strings
    Text,
}

impl BasePredicate {
    fn accepts_strings(&self) -> bool {
        matches!(self, BasePredicate::Text | BasePredicate::EmailShape(_))
    }

    fn accepts_numbers(&self) -> bool {
        matches!(self, BasePredicate::Numeric)
    }
}

/// A narrowing check compiled from one validation rule.
#[derive(Debug)]
enum Check {
    Min(f64, String),
    Max(f64, String),
    MinLength(usize, String),
    MaxLength(usize, String),
    Pattern(Regex, String),
}

#[derive(Debug)]
struct CompiledField {
    name: String,
    base: BasePredicate,
    /// Message to report when the value is missing/empty. Absent means the
    /// field is optional: an empty value short-circuits to valid.
    required: Option<String>,
    checks: Vec<Check>,
    default: Option<Value>,
}

/// Outcome of running a [`CompiledForm`] over a value map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub valid: bool,
    /// Field name to first failing message.
    pub errors: BTreeMap<String, String>,
}

impl Verdict {
    fn ok() -> Self {
        Verdict {
            valid: true,
            errors: BTreeMap::new(),
        }
    }
}

/// A compiled predicate set for one form's fields.
#[derive(Debug)]
pub struct CompiledForm {
    fields: Vec<CompiledField>,
}

/// Compile a field list into a validator. Infallible: unusable rules are
/// skipped, never rejected.
pub fn compile(fields: &[FieldSchema]) -> CompiledForm {
    CompiledForm {
        fields: fields.iter().map(compile_field).collect(),
    }
}

fn compile_field(field: &FieldSchema) -> CompiledField {
    let base = match field.field_type {
        FieldType::Number | FieldType::Range => BasePredicate::Numeric,
        FieldType::Checkbox => BasePredicate::Boolean,
        FieldType::Email => {
            // The pattern is a literal; it always compiles.
            BasePredicate::EmailShape(Regex::new(EMAIL_PATTERN).unwrap())
        }
        FieldType::File => BasePredicate::Opaque,
        FieldType::Array => BasePredicate::Sequence,
        FieldType::Text
        | FieldType::Password
        | FieldType::Select
        | FieldType::Radio
        | FieldType::Textarea
        | FieldType::Date
        | FieldType::Object => BasePredicate::Text,
    };

    let mut required = None;
    let mut checks = Vec::new();

    // Fold rules left-to-right; each either narrows the predicate or is
    // skipped for being incompatible with the base type.
    for rule in &field.validation {
        match rule.rule_type {
            RuleType::Required => {
                if required.is_none() {
                    required = Some(rule.message.clone());
                }
            }
            RuleType::Min => {
                if base.accepts_numbers() {
                    if let Some(n) = rule.value.as_ref().and_then(Value::as_f64) {
                        checks.push(Check::Min(n, rule.message.clone()));
                    }
                }
            }
            RuleType::Max => {
                if base.accepts_numbers() {
                    if let Some(n) = rule.value.as_ref().and_then(Value::as_f64) {
                        checks.push(Check::Max(n, rule.message.clone()));
                    }
                }
            }
            RuleType::MinLength => {
                if base.accepts_strings() {
                    if let Some(n) = rule.value.as_ref().and_then(Value::as_u64) {
                        checks.push(Check::MinLength(n as usize, rule.message.clone()));
                    }
                }
            }
            RuleType::MaxLength => {
                if base.accepts_strings() {
                    if let Some(n) = rule.value.as_ref().and_then(Value::as_u64) {
                        checks.push(Check::MaxLength(n as usize, rule.message.clone()));
                    }
                }
            }
            RuleType::Pattern => {
                if base.accepts_strings() {
                    if let Some(src) = rule.value.as_ref().and_then(Value::as_str) {
                        if let Ok(re) = Regex::new(src) {
                            checks.push(Check::Pattern(re, rule.message.clone()));
                        }
                    }
                }
            }
            // Custom rules run outside the compiler; nothing to build.
            RuleType::Custom => {}
        }
    }

    CompiledField {
        name: field.name.clone(),
        base,
        required,
        checks,
        default: field.default_value.clone(),
    }
}

/// Whether a value counts as "not provided".
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

impl CompiledForm {
    /// Validate every field against the given value map.
    pub fn validate(&self, values: &Map<String, Value>) -> Verdict {
        self.validate_filtered(values, |_| true)
    }

    /// Validate only the fields for which `include` returns true. Used by
    /// the form session to exempt hidden fields entirely.
    pub fn validate_filtered<F>(&self, values: &Map<String, Value>, include: F) -> Verdict
    where
        F: Fn(&str) -> bool,
    {
        let mut verdict = Verdict::ok();

        for field in &self.fields {
            if !include(&field.name) {
                continue;
            }
            if let Some(message) = field.check(values.get(&field.name)) {
                verdict.errors.insert(field.name.clone(), message);
            }
        }

        verdict.valid = verdict.errors.is_empty();
        verdict
    }

    /// Default values declared by the schema, in schema order. Fields
    /// without a `defaultValue` are absent, not zeroed.
    pub fn defaults(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for field in &self.fields {
            if let Some(default) = &field.default {
                map.insert(field.name.clone(), default.clone());
            }
        }
        map
    }
}

impl CompiledField {
    /// Returns the first failing message, or None when the value passes.
    fn check(&self, value: Option<&Value>) -> Option<String> {
        if is_empty_value(value) {
            // Optional fields accept emptiness no matter what other rules
            // they carry.
            return self.required.clone();
        }
        let Some(value) = value else {
            return None;
        };

        if let Some(message) = self.check_base(value) {
            return Some(message);
        }

        for check in &self.checks {
            if let Some(message) = check.apply(value) {
                return Some(message);
            }
        }

        None
    }

    fn check_base(&self, value: &Value) -> Option<String> {
        match &self.base {
            BasePredicate::Numeric => {
                if value.as_f64().is_none() {
                    return Some(format!("{}: expected a number", self.name));
                }
            }
            BasePredicate::Boolean => {
                if !value.is_boolean() {
                    return Some(format!("{}: expected true or false", self.name));
                }
            }
            BasePredicate::EmailShape(re) => match value.as_str() {
                Some(s) => {
                    if !re.is_match(s) {
                        return Some(format!("{}: invalid email address", self.name));
                    }
                }
                None => return Some(format!("{}: expected a string", self.name)),
            },
            BasePredicate::Opaque => {}
            BasePredicate::Sequence => {
                if !value.is_array() {
                    return Some(format!("{}: expected a list", self.name));
                }
            }
            BasePredicate::Text => {
                if !value.is_string() {
                    return Some(format!("{}: expected a string", self.name));
                }
            }
        }
        None
    }
}

impl Check {
    fn apply(&self, value: &Value) -> Option<String> {
        match self {
            Check::Min(bound, message) => {
                let n = value.as_f64()?;
                if n < *bound {
                    return Some(message.clone());
                }
            }
            Check::Max(bound, message) => {
                let n = value.as_f64()?;
                if n > *bound {
                    return Some(message.clone());
                }
            }
            Check::MinLength(bound, message) => {
                let s = value.as_str()?;
                if s.chars().count() < *bound {
                    return Some(message.clone());
                }
            }
            Check::MaxLength(bound, message) => {
                let s = value.as_str()?;
                if s.chars().count() > *bound {
                    return Some(message.clone());
                }
            }
            Check::Pattern(re, message) => {
                let s = value.as_str()?;
                if !re.is_match(s) {
                    return Some(message.clone());
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(yaml: &str) -> FieldSchema {
        serde_yml::from_str(yaml).unwrap()
    }

    fn values(json: Value) -> Map<String, Value> {
        json.as_object().unwrap().clone()
    }

    #[test]
    fn test_required_text_empty_string_fails() {
        let f = field(
            r#"
name: name
type: text
label: Name
validation:
  - type: required
    message: "Name is required"
"#,
        );
        let compiled = compile(&[f]);
        let verdict = compiled.validate(&values(json!({ "name": "" })));
        assert!(!verdict.valid);
        assert_eq!(verdict.errors["name"], "Name is required");
    }

    #[test]
    fn test_required_absent_value_fails() {
        let f = field(
            r#"
name: name
type: text
label: Name
validation:
  - type: required
    message: "Name is required"
"#,
        );
        let compiled = compile(&[f]);
        let verdict = compiled.validate(&Map::new());
        assert!(!verdict.valid);
        assert!(verdict.errors.contains_key("name"));
    }

    #[test]
    fn test_optional_absent_never_errors() {
        // Narrowing rules must not fire on an absent optional value.
        let f = field(
            r#"
name: comment
type: text
label: Comment
validation:
  - type: minLength
    value: 10
    message: "too short"
  - type: pattern
    value: "^[a-z]+$"
    message: "lowercase only"
"#,
        );
        let compiled = compile(&[f]);
        assert!(compiled.validate(&Map::new()).valid);
        assert!(compiled.validate(&values(json!({ "comment": "" }))).valid);
        assert!(compiled.validate(&values(json!({ "comment": null }))).valid);
    }

    #[test]
    fn test_numeric_bounds() {
        let f = field(
            r#"
name: qmax
type: number
label: Qmax
validation:
  - type: min
    value: 0
    message: "must be positive"
  - type: max
    value: 50
    message: "too large"
"#,
        );
        let compiled = compile(&[f]);
        assert!(compiled.validate(&values(json!({ "qmax": 25.0 }))).valid);
        let low = compiled.validate(&values(json!({ "qmax": -1 })));
        assert_eq!(low.errors["qmax"], "must be positive");
        let high = compiled.validate(&values(json!({ "qmax": 60 })));
        assert_eq!(high.errors["qmax"], "too large");
    }

    #[test]
    fn test_numeric_base_predicate_rejects_strings() {
        let f = field(
            r#"
name: qmax
type: number
label: Qmax
"#,
        );
        let compiled = compile(&[f]);
        let verdict = compiled.validate(&values(json!({ "qmax": "abc" })));
        assert!(!verdict.valid);
        assert!(verdict.errors["qmax"].contains("expected a number"));
    }

    #[test]
    fn test_incompatible_rules_are_skipped() {
        // min on a text field and minLength on a number field are no-ops.
        let text = field(
            r#"
name: title
type: text
label: Title
validation:
  - type: min
    value: 5
    message: "numeric rule"
"#,
        );
        let number = field(
            r#"
name: count
type: number
label: Count
validation:
  - type: minLength
    value: 5
    message: "string rule"
"#,
        );
        let compiled = compile(&[text, number]);
        let verdict = compiled.validate(&values(json!({ "title": "a", "count": 1 })));
        assert!(verdict.valid, "{:?}", verdict.errors);
    }

    #[test]
    fn test_string_length_and_pattern() {
        let f = field(
            r#"
name: spacegroup
type: text
label: Space group
validation:
  - type: maxLength
    value: 8
    message: "too long"
  - type: pattern
    value: "^[A-Z]"
    message: "must start uppercase"
"#,
        );
        let compiled = compile(&[f]);
        assert!(compiled
            .validate(&values(json!({ "spacegroup": "Fm-3m" })))
            .valid);
        let bad = compiled.validate(&values(json!({ "spacegroup": "fm-3m" })));
        assert_eq!(bad.errors["spacegroup"], "must start uppercase");
        let long = compiled.validate(&values(json!({ "spacegroup": "P21/n-extra" })));
        assert_eq!(long.errors["spacegroup"], "too long");
    }

    #[test]
    fn test_first_failing_rule_wins() {
        let f = field(
            r#"
name: code
type: text
label: Code
validation:
  - type: minLength
    value: 4
    message: "first"
  - type: pattern
    value: "^[0-9]+$"
    message: "second"
"#,
        );
        let compiled = compile(&[f]);
        let verdict = compiled.validate(&values(json!({ "code": "ab" })));
        assert_eq!(verdict.errors["code"], "first");
    }

    #[test]
    fn test_email_predicate() {
        let f = field(
            r#"
name: contact
type: email
label: Contact
"#,
        );
        let compiled = compile(&[f]);
        assert!(compiled
            .validate(&values(json!({ "contact": "a@b.org" })))
            .valid);
        let bad = compiled.validate(&values(json!({ "contact": "not-an-email" })));
        assert!(bad.errors["contact"].contains("invalid email"));
        // Absent email without required is fine.
        assert!(compiled.validate(&Map::new()).valid);
    }

    #[test]
    fn test_checkbox_false_is_a_present_value() {
        let f = field(
            r#"
name: agree
type: checkbox
label: Agree
validation:
  - type: required
    message: "answer required"
"#,
        );
        let compiled = compile(&[f]);
        assert!(compiled.validate(&values(json!({ "agree": false }))).valid);
        let missing = compiled.validate(&Map::new());
        assert_eq!(missing.errors["agree"], "answer required");
    }

    #[test]
    fn test_array_predicate() {
        let f = field(
            r#"
name: tags
type: array
label: Tags
"#,
        );
        let compiled = compile(&[f]);
        assert!(compiled
            .validate(&values(json!({ "tags": ["a", "b"] })))
            .valid);
        let bad = compiled.validate(&values(json!({ "tags": "a,b" })));
        assert!(bad.errors["tags"].contains("expected a list"));
    }

    #[test]
    fn test_invalid_pattern_rule_is_dropped() {
        let f = field(
            r#"
name: code
type: text
label: Code
validation:
  - type: pattern
    value: "([unclosed"
    message: "never fires"
"#,
        );
        let compiled = compile(&[f]);
        assert!(compiled.validate(&values(json!({ "code": "x" }))).valid);
    }

    #[test]
    fn test_defaults_in_schema_order_and_idempotent() {
        let fields: Vec<FieldSchema> = serde_yml::from_str(
            r#"
- name: rmax
  type: number
  label: rmax
  defaultValue: 10.0
- name: note
  type: text
  label: Note
- name: rmin
  type: number
  label: rmin
  defaultValue: 0.01
"#,
        )
        .unwrap();
        let compiled = compile(&fields);
        let first = compiled.defaults();
        let second = compiled.defaults();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2, "fields without defaults are absent");
        let keys: Vec<&String> = first.keys().collect();
        assert_eq!(keys, vec!["rmax", "rmin"]);
    }

    #[test]
    fn test_validate_filtered_exempts_fields() {
        let f = field(
            r#"
name: hidden
type: text
label: Hidden
validation:
  - type: required
    message: "required"
"#,
        );
        let compiled = compile(&[f]);
        let verdict = compiled.validate_filtered(&Map::new(), |name| name != "hidden");
        assert!(verdict.valid);
    }
}
