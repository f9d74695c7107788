//! Schema document validation with detailed error reporting
//!
//! Documents are checked in two passes: against the embedded JSON Schema
//! for their kind (hard errors with source spans), then against
//! structural lints JSON Schema cannot express - duplicate field names,
//! dangling conditionals, inert rules.

use jsonschema::{validator_for, ValidationError as JsonSchemaError, Validator as JsonValidator};
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::form::compiler::is_empty_value;
use crate::schema::forms::{FieldSchema, FieldType, FormSchema, RuleType, WizardSchema};
use crate::schema::registry::{SchemaDocument, SchemaKind, SchemaRegistry};

/// Validation failure with source location information
#[derive(Debug, Error, Diagnostic)]
#[error("Schema document validation failed: {summary}")]
#[diagnostic(code(fitforms::schema::document))]
pub struct DocumentError {
    summary: String,

    #[source_code]
    src: NamedSource<String>,

    #[related]
    violations: Vec<SchemaViolation>,
}

/// A single document violation
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct SchemaViolation {
    #[label("{}", self.hint)]
    span: SourceSpan,

    message: String,
    hint: String,

    #[help]
    help: Option<String>,
}

impl SchemaViolation {
    pub fn new(message: String, hint: String, span: SourceSpan, help: Option<String>) -> Self {
        Self {
            span,
            message,
            hint,
            help,
        }
    }
}

impl DocumentError {
    pub fn new(filename: &str, source: &str, violations: Vec<SchemaViolation>) -> Self {
        let count = violations.len();
        let summary = if count == 1 {
            "1 error".to_string()
        } else {
            format!("{} errors", count)
        };
        Self {
            summary,
            src: NamedSource::new(filename, source.to_string()),
            violations,
        }
    }

    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }
}

/// Result of the lint pass
#[derive(Debug, Default)]
pub struct LintReport {
    pub errors: Vec<LintIssue>,
    pub warnings: Vec<LintIssue>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Whether the document is usable. With `strict`, warnings count.
    pub fn passes(&self, strict: bool) -> bool {
        self.errors.is_empty() && (!strict || self.warnings.is_empty())
    }
}

/// A structural problem found by the lint pass
#[derive(Debug, Clone)]
pub struct LintIssue {
    /// Dotted path into the document, e.g. `steps.range.fields.rstep`.
    pub path: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl LintIssue {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Validator holding the compiled meta schemas
pub struct DocumentValidator {
    form: Option<JsonValidator>,
    wizard: Option<JsonValidator>,
}

impl DocumentValidator {
    pub fn new() -> Self {
        Self {
            form: compile_meta(SchemaKind::Form),
            wizard: compile_meta(SchemaKind::Wizard),
        }
    }

    /// Check one document: meta-schema violations come back as `Err` with
    /// labelled spans; a clean meta pass yields the lint report.
    pub fn check(
        &self,
        content: &str,
        filename: &str,
        kind: SchemaKind,
    ) -> Result<LintReport, DocumentError> {
        let json_value: JsonValue = match serde_yml::from_str(content) {
            Ok(v) => v,
            Err(e) => {
                let span = find_error_span(content, e.location());
                let violation = SchemaViolation::new(
                    format!("YAML parse error: {}", e),
                    "invalid YAML".to_string(),
                    span,
                    Some("Check YAML syntax - indentation, colons, quotes".to_string()),
                );
                return Err(DocumentError::new(filename, content, vec![violation]));
            }
        };

        let meta = match kind {
            SchemaKind::Form => self.form.as_ref(),
            SchemaKind::Wizard => self.wizard.as_ref(),
        };

        if let Some(meta) = meta {
            let violations: Vec<SchemaViolation> = meta
                .iter_errors(&json_value)
                .map(|e| error_to_violation(content, &e))
                .collect();
            if !violations.is_empty() {
                return Err(DocumentError::new(filename, content, violations));
            }
        }

        // The meta schema passed, so the typed parse is expected to
        // succeed; a failure here still reports instead of panicking.
        let document = match kind {
            SchemaKind::Form => serde_yml::from_str::<FormSchema>(content)
                .map(SchemaDocument::Form)
                .map_err(|e| typed_parse_violation(content, filename, &e)),
            SchemaKind::Wizard => serde_yml::from_str::<WizardSchema>(content)
                .map(SchemaDocument::Wizard)
                .map_err(|e| typed_parse_violation(content, filename, &e)),
        }?;

        Ok(lint_document(&document))
    }
}

impl Default for DocumentValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn compile_meta(kind: SchemaKind) -> Option<JsonValidator> {
    let source = SchemaRegistry::meta_schema(kind);
    let schema_json = serde_json::from_str::<JsonValue>(&source).ok()?;
    validator_for(&schema_json).ok()
}

fn typed_parse_violation(content: &str, filename: &str, e: &serde_yml::Error) -> DocumentError {
    let span = find_error_span(content, e.location());
    let violation = SchemaViolation::new(
        format!("Document shape error: {}", e),
        "does not fit the document model".to_string(),
        span,
        None,
    );
    DocumentError::new(filename, content, vec![violation])
}

// ============================================================================
// Lint pass
// ============================================================================

/// Structural checks over a parsed document.
pub fn lint_document(document: &SchemaDocument) -> LintReport {
    let mut report = LintReport::default();
    match document {
        SchemaDocument::Form(form) => lint_form(form, "fields", &mut report),
        SchemaDocument::Wizard(wizard) => lint_wizard(wizard, &mut report),
    }
    report
}

fn lint_wizard(wizard: &WizardSchema, report: &mut LintReport) {
    let mut seen = std::collections::BTreeSet::new();
    for step in &wizard.steps {
        if !seen.insert(step.id.as_str()) {
            report.errors.push(
                LintIssue::new("steps", format!("duplicate step id '{}'", step.id))
                    .suggest("Step ids key the wizard accumulator and must be unique"),
            );
        }
        let prefix = format!("steps.{}.fields", step.id);
        lint_form(&step.form, &prefix, report);
    }
}

fn lint_form(form: &FormSchema, prefix: &str, report: &mut LintReport) {
    let mut seen = std::collections::BTreeSet::new();
    for field in &form.fields {
        let path = format!("{}.{}", prefix, field.name);

        if !seen.insert(field.name.as_str()) {
            report.errors.push(
                LintIssue::new(prefix, format!("duplicate field name '{}'", field.name))
                    .suggest("Field names key the value map and must be unique within a form"),
            );
        }

        if let Some(cond) = &field.conditional {
            if form.field(&cond.field).is_none() {
                report.errors.push(
                    LintIssue::new(
                        &path,
                        format!("conditional references unknown field '{}'", cond.field),
                    )
                    .suggest("Conditionals can only watch fields of the same form"),
                );
            }
        }

        if matches!(field.field_type, FieldType::Select | FieldType::Radio)
            && field.options.is_empty()
        {
            report.errors.push(
                LintIssue::new(&path, format!("{} field has no options", field.field_type))
                    .suggest("Add an `options` list with value/label pairs"),
            );
        }

        lint_default(field, &path, report);
        lint_rules(field, &path, report);
    }
}

fn lint_default(field: &FieldSchema, path: &str, report: &mut LintReport) {
    let Some(default) = &field.default_value else {
        return;
    };
    if is_empty_value(Some(default)) {
        return;
    }
    let mismatch = match field.field_type {
        FieldType::Number | FieldType::Range => !default.is_number(),
        FieldType::Checkbox => !default.is_boolean(),
        FieldType::Array => !default.is_array(),
        FieldType::File => false,
        _ => !default.is_string(),
    };
    if mismatch {
        report.warnings.push(
            LintIssue::new(
                path,
                format!(
                    "defaultValue does not match the {} base type",
                    field.field_type
                ),
            )
            .suggest("The default will fail validation as soon as the field is submitted"),
        );
    }
}

fn lint_rules(field: &FieldSchema, path: &str, report: &mut LintReport) {
    let numeric = matches!(field.field_type, FieldType::Number | FieldType::Range);
    let stringy = !matches!(
        field.field_type,
        FieldType::Number
            | FieldType::Range
            | FieldType::Checkbox
            | FieldType::File
            | FieldType::Array
    );

    for rule in &field.validation {
        match rule.rule_type {
            RuleType::Custom => {
                report.warnings.push(
                    LintIssue::new(path, "custom rules are not executed")
                        .suggest("Express the constraint with pattern/min/max rules instead"),
                );
            }
            RuleType::Pattern => {
                if !stringy {
                    report.warnings.push(inert_rule(path, "pattern", field));
                } else if let Some(src) = rule.value.as_ref().and_then(JsonValue::as_str) {
                    if let Err(e) = regex::Regex::new(src) {
                        report.errors.push(
                            LintIssue::new(path, format!("invalid pattern: {}", e))
                                .suggest("The rule would be silently dropped at compile time"),
                        );
                    }
                } else {
                    report
                        .errors
                        .push(LintIssue::new(path, "pattern rule needs a string value"));
                }
            }
            RuleType::Min | RuleType::Max => {
                if !numeric {
                    report.warnings.push(inert_rule(
                        path,
                        if rule.rule_type == RuleType::Min {
                            "min"
                        } else {
                            "max"
                        },
                        field,
                    ));
                }
            }
            RuleType::MinLength | RuleType::MaxLength => {
                if !stringy {
                    report.warnings.push(inert_rule(
                        path,
                        if rule.rule_type == RuleType::MinLength {
                            "minLength"
                        } else {
                            "maxLength"
                        },
                        field,
                    ));
                }
            }
            RuleType::Required => {}
        }
    }
}

fn inert_rule(path: &str, rule: &str, field: &FieldSchema) -> LintIssue {
    LintIssue::new(
        path,
        format!("{} rule is inert on a {} field", rule, field.field_type),
    )
    .suggest("Type-incompatible rules are skipped at compile time")
}

// ============================================================================
// JSON Schema error mapping (spans into the YAML source)
// ============================================================================

/// Convert a JSON Schema validation error to our violation format
fn error_to_violation(content: &str, error: &JsonSchemaError) -> SchemaViolation {
    let path = error.instance_path.to_string();
    let message = format_schema_error(error);
    let hint = format_error_hint(error);
    let help = generate_help_message(error);
    let span = find_path_span(content, &path);

    SchemaViolation::new(message, hint, span, help)
}

/// Format a JSON Schema error into a user-friendly message
fn format_schema_error(error: &JsonSchemaError) -> String {
    let path = if error.instance_path.as_str().is_empty() {
        "document root".to_string()
    } else {
        format!("'{}'", error.instance_path)
    };

    match &error.kind {
        jsonschema::error::ValidationErrorKind::Required { property } => {
            let prop_str = property
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| property.to_string());
            format!("Missing required key: {} at {}", prop_str, path)
        }
        jsonschema::error::ValidationErrorKind::Type { kind } => {
            format!("Wrong type at {}: expected {:?}", path, kind)
        }
        jsonschema::error::ValidationErrorKind::Enum { options } => {
            format!(
                "Invalid value at {}: must be one of: {}",
                path,
                format_enum_options(options)
            )
        }
        jsonschema::error::ValidationErrorKind::MinItems { limit } => {
            format!("List at {} needs at least {} item(s)", path, limit)
        }
        jsonschema::error::ValidationErrorKind::MinLength { limit } => {
            format!(
                "Value at {} is too short: minimum {} characters",
                path, limit
            )
        }
        jsonschema::error::ValidationErrorKind::AdditionalProperties { unexpected } => {
            format!("Unknown key(s) at {}: {}", path, unexpected.join(", "))
        }
        _ => {
            format!("Validation error at {}: {}", path, error)
        }
    }
}

fn format_enum_options(options: &JsonValue) -> String {
    if let Some(arr) = options.as_array() {
        arr.iter()
            .map(|v| {
                v.as_str()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| v.to_string())
            })
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        options.to_string()
    }
}

/// Generate a short hint for the error label
fn format_error_hint(error: &JsonSchemaError) -> String {
    match &error.kind {
        jsonschema::error::ValidationErrorKind::Required { .. } => {
            "required key missing".to_string()
        }
        jsonschema::error::ValidationErrorKind::Type { .. } => "wrong type".to_string(),
        jsonschema::error::ValidationErrorKind::Enum { .. } => "invalid value".to_string(),
        jsonschema::error::ValidationErrorKind::MinItems { .. } => "too few items".to_string(),
        jsonschema::error::ValidationErrorKind::AdditionalProperties { .. } => {
            "unknown key".to_string()
        }
        _ => "validation error".to_string(),
    }
}

/// Generate a help message with suggestions for fixing the error
fn generate_help_message(error: &JsonSchemaError) -> Option<String> {
    match &error.kind {
        jsonschema::error::ValidationErrorKind::Required { property } => {
            let prop_str = property
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| property.to_string());
            Some(format!("Add the '{}' key to the document", prop_str))
        }
        jsonschema::error::ValidationErrorKind::Enum { options } => {
            Some(format!("Valid values: {}", format_enum_options(options)))
        }
        jsonschema::error::ValidationErrorKind::Type { kind } => {
            Some(format!("Expected value of type: {:?}", kind))
        }
        jsonschema::error::ValidationErrorKind::AdditionalProperties { unexpected } => {
            if unexpected.len() == 1 {
                Some(format!(
                    "Remove the '{}' key or check spelling",
                    unexpected[0]
                ))
            } else {
                Some("Remove unknown keys or check spelling".to_string())
            }
        }
        _ => None,
    }
}

/// Find the span (byte offset, length) for an error location
fn find_error_span(content: &str, location: Option<serde_yml::Location>) -> SourceSpan {
    if let Some(loc) = location {
        let line = loc.line().saturating_sub(1);
        let column = loc.column().saturating_sub(1);

        let mut offset = 0;
        for (i, line_content) in content.lines().enumerate() {
            if i == line {
                offset += column;
                break;
            }
            offset += line_content.len() + 1;
        }

        let rest_of_content = &content[offset.min(content.len())..];
        let len = rest_of_content
            .find('\n')
            .unwrap_or(rest_of_content.len())
            .max(1);

        (offset, len).into()
    } else {
        let len = content.find('\n').unwrap_or(content.len()).max(1);
        (0, len).into()
    }
}

/// Find the span for a JSON path in YAML content
fn find_path_span(content: &str, json_path: &str) -> SourceSpan {
    let parts: Vec<&str> = json_path.split('/').filter(|s| !s.is_empty()).collect();

    if parts.is_empty() {
        let len = content.find('\n').unwrap_or(content.len()).max(1);
        return (0, len).into();
    }

    let search_key = parts.last().unwrap_or(&"");

    // Array indices point back at their parent key.
    if search_key.parse::<usize>().is_ok() && parts.len() >= 2 {
        let parent_key = parts[parts.len() - 2];
        if let Some(span) = find_key_span(content, parent_key) {
            return span;
        }
    }

    if let Some(span) = find_key_span(content, search_key) {
        return span;
    }

    let len = content.find('\n').unwrap_or(content.len()).max(1);
    (0, len).into()
}

/// Find the span of a key in YAML content
fn find_key_span(content: &str, key: &str) -> Option<SourceSpan> {
    let search_pattern = format!("{}:", key);

    let mut offset = 0;
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with(&search_pattern) {
            let key_start = offset + (line.len() - trimmed.len());
            let key_len = line.len() - (line.len() - trimmed.len());
            return Some((key_start, key_len).into());
        }
        offset += line.len() + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(content: &str, kind: SchemaKind) -> Result<LintReport, DocumentError> {
        DocumentValidator::new().check(content, "test.yaml", kind)
    }

    #[test]
    fn test_valid_form_document() {
        let yaml = r#"
id: sample
title: Sample
fields:
  - name: name
    type: text
    label: Name
    validation:
      - type: required
        message: "Name is required"
"#;
        let report = check(yaml, SchemaKind::Form).unwrap();
        assert!(report.is_clean(), "{:?}", report);
    }

    #[test]
    fn test_missing_required_keys() {
        let yaml = "id: sample\ntitle: Sample\n";
        let err = check(yaml, SchemaKind::Form).unwrap_err();
        assert!(err.violation_count() > 0);
    }

    #[test]
    fn test_unknown_field_type_rejected_by_meta() {
        let yaml = r#"
id: sample
title: Sample
fields:
  - name: x
    type: slider
    label: X
"#;
        assert!(check(yaml, SchemaKind::Form).is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let yaml = r#"
id: sample
title: Sample
fields: []
bogus: true
"#;
        assert!(check(yaml, SchemaKind::Form).is_err());
    }

    #[test]
    fn test_duplicate_field_names_lint() {
        let yaml = r#"
id: sample
title: Sample
fields:
  - name: x
    type: text
    label: One
  - name: x
    type: text
    label: Two
"#;
        let report = check(yaml, SchemaKind::Form).unwrap();
        assert!(!report.passes(false));
        assert!(report.errors[0].message.contains("duplicate field name"));
    }

    #[test]
    fn test_dangling_conditional_lint() {
        let yaml = r#"
id: sample
title: Sample
fields:
  - name: x
    type: text
    label: X
    conditional:
      field: ghost
      value: "yes"
"#;
        let report = check(yaml, SchemaKind::Form).unwrap();
        assert!(report
            .errors
            .iter()
            .any(|e| e.message.contains("unknown field 'ghost'")));
    }

    #[test]
    fn test_select_without_options_lint() {
        let yaml = r#"
id: sample
title: Sample
fields:
  - name: choice
    type: select
    label: Choice
"#;
        let report = check(yaml, SchemaKind::Form).unwrap();
        assert!(report
            .errors
            .iter()
            .any(|e| e.message.contains("no options")));
    }

    #[test]
    fn test_default_type_mismatch_is_warning() {
        let yaml = r#"
id: sample
title: Sample
fields:
  - name: qmax
    type: number
    label: Qmax
    defaultValue: "twenty-five"
"#;
        let report = check(yaml, SchemaKind::Form).unwrap();
        assert!(report.errors.is_empty());
        assert!(report
            .warnings
            .iter()
            .any(|w| w.message.contains("base type")));
        assert!(report.passes(false));
        assert!(!report.passes(true));
    }

    #[test]
    fn test_inert_rule_warning_and_bad_pattern_error() {
        let yaml = r#"
id: sample
title: Sample
fields:
  - name: qmax
    type: number
    label: Qmax
    validation:
      - type: minLength
        value: 3
        message: "inert"
  - name: code
    type: text
    label: Code
    validation:
      - type: pattern
        value: "([unclosed"
        message: "bad"
"#;
        let report = check(yaml, SchemaKind::Form).unwrap();
        assert!(report.warnings.iter().any(|w| w.message.contains("inert")));
        assert!(report
            .errors
            .iter()
            .any(|e| e.message.contains("invalid pattern")));
    }

    #[test]
    fn test_wizard_duplicate_step_ids() {
        let yaml = r#"
id: w
title: W
steps:
  - id: one
    title: One
    form: { id: a, title: A, fields: [] }
  - id: one
    title: Again
    form: { id: b, title: B, fields: [] }
"#;
        let report = check(yaml, SchemaKind::Wizard).unwrap();
        assert!(report
            .errors
            .iter()
            .any(|e| e.message.contains("duplicate step id")));
    }

    #[test]
    fn test_wizard_needs_steps() {
        let yaml = "id: w\ntitle: W\nsteps: []\n";
        assert!(check(yaml, SchemaKind::Wizard).is_err());
    }

    #[test]
    fn test_builtin_documents_are_clean() {
        let registry = SchemaRegistry::new();
        let validator = DocumentValidator::new();
        for entry in registry.entries() {
            let loaded = registry.resolve(&entry.name).unwrap();
            let report = validator
                .check(&loaded.source, &loaded.filename, entry.kind)
                .unwrap_or_else(|e| panic!("{}: {}", entry.name, e));
            assert!(report.is_clean(), "{}: {:?}", entry.name, report);
        }
    }

    #[test]
    fn test_find_key_span() {
        let content = "id: sample\ntitle: Sample\nfields: []\n";
        let span = find_key_span(content, "fields").unwrap();
        let offset: usize = span.offset();
        assert!(offset > 0);
    }
}
