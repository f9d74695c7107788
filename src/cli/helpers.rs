//! Shared helper functions for CLI commands

use miette::{miette, IntoDiagnostic, Result};
use serde_json::{Map, Value};
use std::io::Write;
use std::path::Path;

use crate::cli::OutputFormat;

/// Truncate a string to max_len, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}

/// Parse a `--set name=value` pair. The value side is parsed as a YAML
/// scalar so numbers and booleans come through typed; anything that
/// fails to parse is taken as a plain string.
pub fn parse_set_pair(pair: &str) -> Result<(String, Value)> {
    let (name, raw) = pair
        .split_once('=')
        .ok_or_else(|| miette!("--set takes NAME=VALUE, got '{}'", pair))?;
    if name.is_empty() {
        return Err(miette!("--set needs a field name before '=': '{}'", pair));
    }
    let value =
        serde_yml::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.to_string(), value))
}

/// Read a YAML or JSON file into a top-level value map.
pub fn load_values_file(path: &Path) -> Result<Map<String, Value>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| miette!("failed to read {}: {}", path.display(), e))?;
    let value: Value = serde_yml::from_str(&content)
        .map_err(|e| miette!("{} is not valid YAML/JSON: {}", path.display(), e))?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(miette!(
            "{} must contain a mapping at the top level",
            path.display()
        )),
    }
}

/// Write a payload value in the requested format, to stdout or a file.
/// `Auto` means YAML for payloads; TSV flattens the top level to
/// key/value lines for piping.
pub fn emit_value(value: &Value, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => {
            let mut s = serde_json::to_string_pretty(value).into_diagnostic()?;
            s.push('\n');
            s
        }
        OutputFormat::Tsv => render_tsv(value),
        OutputFormat::Auto | OutputFormat::Yaml => serde_yml::to_string(value).into_diagnostic()?,
    };

    match output {
        Some(path) => std::fs::write(path, rendered)
            .map_err(|e| miette!("failed to write {}: {}", path.display(), e)),
        None => std::io::stdout()
            .write_all(rendered.as_bytes())
            .into_diagnostic(),
    }
}

fn render_tsv(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                out.push_str(key);
                out.push('\t');
                out.push_str(&tsv_cell(value));
                out.push('\n');
            }
        }
        other => {
            out.push_str(&tsv_cell(other));
            out.push('\n');
        }
    }
    out
}

/// Scalars print bare; anything nested collapses to inline JSON so a
/// row stays a single line.
fn tsv_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        nested @ (Value::Object(_) | Value::Array(_)) => {
            serde_json::to_string(nested).unwrap_or_default()
        }
        scalar => scalar.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
    }

    #[test]
    fn test_parse_set_pair_types() {
        assert_eq!(
            parse_set_pair("name=nickel").unwrap(),
            ("name".to_string(), json!("nickel"))
        );
        assert_eq!(
            parse_set_pair("qmax=25.0").unwrap(),
            ("qmax".to_string(), json!(25.0))
        );
        assert_eq!(
            parse_set_pair("archived=true").unwrap(),
            ("archived".to_string(), json!(true))
        );
        // Values may contain '='.
        assert_eq!(
            parse_set_pair("formula=a=b").unwrap(),
            ("formula".to_string(), json!("a=b"))
        );
    }

    #[test]
    fn test_parse_set_pair_rejects_malformed() {
        assert!(parse_set_pair("no-equals").is_err());
        assert!(parse_set_pair("=value").is_err());
    }

    #[test]
    fn test_load_values_file_requires_mapping() {
        let tmp = tempfile::tempdir().unwrap();
        let good = tmp.path().join("values.yaml");
        std::fs::write(&good, "name: nickel\nqmax: 25.0\n").unwrap();
        let map = load_values_file(&good).unwrap();
        assert_eq!(map["qmax"], json!(25.0));

        let bad = tmp.path().join("list.yaml");
        std::fs::write(&bad, "- a\n- b\n").unwrap();
        assert!(load_values_file(&bad).is_err());
    }

    #[test]
    fn test_tsv_rendering() {
        let value = json!({ "name": "nickel", "qmax": 25.0, "steps": { "a": 1 } });
        let tsv = render_tsv(&value);
        assert!(tsv.contains("name\tnickel\n"));
        assert!(tsv.contains("qmax\t25.0\n"));
        assert!(tsv.contains("steps\t{\"a\":1}\n"));
    }
}
