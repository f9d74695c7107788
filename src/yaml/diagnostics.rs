//! YAML error diagnostics with source-located error messages

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// YAML syntax error with source location
#[derive(Debug, Error, Diagnostic)]
#[error("YAML syntax error")]
#[diagnostic(code(fitforms::yaml::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("error here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    /// The underlying error message
    message: String,
}

impl YamlSyntaxError {
    /// Create a syntax error from a serde_yml error
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));

        let offset = line_col_to_offset(source, line, column);
        let message = err.to_string();
        let help = generate_help(&message);

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help,
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Generic YAML error wrapper
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert line/column to byte offset
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    let mut current_line = 1;

    for (i, ch) in source.char_indices() {
        if current_line == line {
            offset = i + column.saturating_sub(1);
            break;
        }
        if ch == '\n' {
            current_line += 1;
        }
    }

    offset.min(source.len())
}

/// Suggest a fix for the most common schema-document mistakes
fn generate_help(message: &str) -> Option<String> {
    if message.contains("unknown variant") {
        if message.contains("type") || message.contains("field") {
            return Some(
                "Field types are: text, number, email, password, select, checkbox, \
                 radio, textarea, file, range, date, array, object"
                    .to_string(),
            );
        }
        return Some("Check the value against the document's allowed keywords".to_string());
    }
    if message.contains("missing field") {
        return Some("Every field needs at least `name`, `type`, and `label`".to_string());
    }
    if message.contains("tab") {
        return Some("YAML uses spaces for indentation, never tabs".to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_serde_error_locates_bad_line() {
        let source = "id: test\ntitle: Test\nfields: [\n";
        let err = serde_yml::from_str::<serde_yml::Value>(source).unwrap_err();
        let diag = YamlSyntaxError::from_serde_error(&err, source, "bad.form.yaml");
        assert!(!diag.message().is_empty());
    }

    #[test]
    fn test_line_col_to_offset() {
        let source = "a: 1\nb: 2\nc: 3\n";
        assert_eq!(line_col_to_offset(source, 1, 1), 0);
        assert_eq!(line_col_to_offset(source, 2, 1), 5);
        assert_eq!(line_col_to_offset(source, 2, 4), 8);
    }

    #[test]
    fn test_help_for_unknown_field_type() {
        let help = generate_help("unknown variant `slider`, expected one of ... for key type");
        assert!(help.unwrap().contains("checkbox"));
    }
}
