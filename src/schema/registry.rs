//! Schema registry - builtin documents plus a configurable search directory
//!
//! Builtin form and wizard documents ship embedded in the binary. A
//! configured schema directory is consulted first, so a user document can
//! shadow a builtin of the same name. Document kind comes from the
//! filename suffix (`.form.yaml` / `.wizard.yaml`); files without one are
//! sniffed by shape.

use miette::Diagnostic;
use rust_embed::Embed;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::schema::forms::{FormSchema, WizardSchema};
use crate::yaml::YamlSyntaxError;

#[derive(Embed)]
#[folder = "schemas/"]
struct EmbeddedSchemas;

/// What a schema document describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Form,
    Wizard,
}

impl SchemaKind {
    /// Infer the kind from a document filename.
    pub fn from_filename(filename: &str) -> Option<Self> {
        if filename.ends_with(".form.yaml") || filename.ends_with(".form.yml") {
            Some(SchemaKind::Form)
        } else if filename.ends_with(".wizard.yaml") || filename.ends_with(".wizard.yml") {
            Some(SchemaKind::Wizard)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::Form => "form",
            SchemaKind::Wizard => "wizard",
        }
    }
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed schema document of either kind.
#[derive(Debug, Clone)]
pub enum SchemaDocument {
    Form(FormSchema),
    Wizard(WizardSchema),
}

impl SchemaDocument {
    pub fn kind(&self) -> SchemaKind {
        match self {
            SchemaDocument::Form(_) => SchemaKind::Form,
            SchemaDocument::Wizard(_) => SchemaKind::Wizard,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            SchemaDocument::Form(f) => &f.id,
            SchemaDocument::Wizard(w) => &w.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            SchemaDocument::Form(f) => &f.title,
            SchemaDocument::Wizard(w) => &w.title,
        }
    }
}

/// A resolved document with its source text kept for diagnostics.
#[derive(Debug)]
pub struct LoadedSchema {
    /// Registry name or the path the caller gave.
    pub name: String,
    pub filename: String,
    pub source: String,
    pub document: SchemaDocument,
}

/// One listable registry entry.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub name: String,
    pub kind: SchemaKind,
    /// "builtin" or the search directory path.
    pub origin: String,
    pub filename: String,
}

#[derive(Debug, Error, Diagnostic)]
pub enum SchemaError {
    #[error("no schema named '{name}'")]
    #[diagnostic(
        code(fitforms::schema::not_found),
        help("`fitforms list` shows the available schemas")
    )]
    NotFound { name: String },

    #[error("cannot tell whether '{filename}' is a form or a wizard")]
    #[diagnostic(
        code(fitforms::schema::unknown_kind),
        help("name the file *.form.yaml or *.wizard.yaml, or give it a `fields:` or `steps:` key")
    )]
    UnknownKind { filename: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("failed to read {path}: {source}")]
    #[diagnostic(code(fitforms::schema::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Lookup over builtin and user-provided schema documents.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    search_dir: Option<PathBuf>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consult `dir` before the embedded documents.
    pub fn with_search_dir(search_dir: Option<PathBuf>) -> Self {
        SchemaRegistry { search_dir }
    }

    /// All known entries: search-directory documents first, then builtins
    /// not shadowed by them. Sorted by name.
    pub fn entries(&self) -> Vec<RegistryEntry> {
        let mut entries: Vec<RegistryEntry> = Vec::new();

        if let Some(dir) = &self.search_dir {
            if let Ok(read) = std::fs::read_dir(dir) {
                for entry in read.flatten() {
                    let filename = entry.file_name().to_string_lossy().to_string();
                    if let Some(kind) = SchemaKind::from_filename(&filename) {
                        entries.push(RegistryEntry {
                            name: strip_suffix(&filename),
                            kind,
                            origin: dir.display().to_string(),
                            filename,
                        });
                    }
                }
            }
        }

        for filename in EmbeddedSchemas::iter() {
            let filename = filename.to_string();
            let Some(kind) = SchemaKind::from_filename(&filename) else {
                // meta/ JSON Schemas and other support files
                continue;
            };
            let name = strip_suffix(&filename);
            if entries.iter().any(|e| e.name == name) {
                continue;
            }
            entries.push(RegistryEntry {
                name,
                kind,
                origin: "builtin".to_string(),
                filename,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    /// Fetch a document's source by registry name.
    pub fn source(&self, name: &str) -> Option<(String, String)> {
        if let Some(dir) = &self.search_dir {
            for suffix in [".form.yaml", ".wizard.yaml", ".form.yml", ".wizard.yml"] {
                let candidate = dir.join(format!("{}{}", name, suffix));
                if candidate.exists() {
                    if let Ok(source) = std::fs::read_to_string(&candidate) {
                        return Some((candidate.display().to_string(), source));
                    }
                }
            }
        }

        for suffix in [".form.yaml", ".wizard.yaml"] {
            let filename = format!("{}{}", name, suffix);
            if let Some(file) = EmbeddedSchemas::get(&filename) {
                let source = String::from_utf8_lossy(&file.data).to_string();
                return Some((filename, source));
            }
        }
        None
    }

    /// The embedded JSON Schema a document of `kind` must satisfy.
    pub fn meta_schema(kind: SchemaKind) -> String {
        let filename = match kind {
            SchemaKind::Form => "meta/form.schema.json",
            SchemaKind::Wizard => "meta/wizard.schema.json",
        };
        // Embedded at build time; always present.
        EmbeddedSchemas::get(filename)
            .map(|f| String::from_utf8_lossy(&f.data).to_string())
            .unwrap_or_default()
    }

    /// Resolve a registry name or a filesystem path to a parsed document.
    pub fn resolve(&self, name_or_path: &str) -> Result<LoadedSchema, SchemaError> {
        let path = Path::new(name_or_path);
        let looks_like_path = name_or_path.contains(std::path::MAIN_SEPARATOR)
            || name_or_path.ends_with(".yaml")
            || name_or_path.ends_with(".yml");

        if looks_like_path || path.exists() {
            return load_file(path);
        }

        let (filename, source) = self
            .source(name_or_path)
            .ok_or_else(|| SchemaError::NotFound {
                name: name_or_path.to_string(),
            })?;
        let document = parse_document(&source, &filename)?;
        Ok(LoadedSchema {
            name: name_or_path.to_string(),
            filename,
            source,
            document,
        })
    }
}

fn strip_suffix(filename: &str) -> String {
    filename
        .trim_end_matches(".yaml")
        .trim_end_matches(".yml")
        .trim_end_matches(".form")
        .trim_end_matches(".wizard")
        .to_string()
}

fn load_file(path: &Path) -> Result<LoadedSchema, SchemaError> {
    let source = std::fs::read_to_string(path).map_err(|e| SchemaError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let filename = path.display().to_string();
    let document = parse_document(&source, &filename)?;
    Ok(LoadedSchema {
        name: filename.clone(),
        filename,
        source,
        document,
    })
}

/// Parse a document, inferring kind from the filename or, failing that,
/// from whether the document carries `steps` or `fields`.
pub fn parse_document(source: &str, filename: &str) -> Result<SchemaDocument, SchemaError> {
    let kind = match SchemaKind::from_filename(filename) {
        Some(kind) => kind,
        None => sniff_kind(source, filename)?,
    };

    match kind {
        SchemaKind::Form => serde_yml::from_str::<FormSchema>(source)
            .map(SchemaDocument::Form)
            .map_err(|e| YamlSyntaxError::from_serde_error(&e, source, filename).into()),
        SchemaKind::Wizard => serde_yml::from_str::<WizardSchema>(source)
            .map(SchemaDocument::Wizard)
            .map_err(|e| YamlSyntaxError::from_serde_error(&e, source, filename).into()),
    }
}

fn sniff_kind(source: &str, filename: &str) -> Result<SchemaKind, SchemaError> {
    let value: serde_json::Value = serde_yml::from_str(source)
        .map_err(|e| SchemaError::from(YamlSyntaxError::from_serde_error(&e, source, filename)))?;
    if value.get("steps").is_some() {
        Ok(SchemaKind::Wizard)
    } else if value.get("fields").is_some() {
        Ok(SchemaKind::Form)
    } else {
        Err(SchemaError::UnknownKind {
            filename: filename.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_filename() {
        assert_eq!(
            SchemaKind::from_filename("new-project.form.yaml"),
            Some(SchemaKind::Form)
        );
        assert_eq!(
            SchemaKind::from_filename("fit-setup.wizard.yaml"),
            Some(SchemaKind::Wizard)
        );
        assert_eq!(SchemaKind::from_filename("README.md"), None);
        assert_eq!(SchemaKind::from_filename("meta/form.schema.json"), None);
    }

    #[test]
    fn test_builtins_are_listed() {
        let registry = SchemaRegistry::new();
        let entries = registry.entries();
        assert!(entries.iter().any(|e| e.name == "new-project"));
        assert!(entries
            .iter()
            .any(|e| e.name == "fit-setup" && e.kind == SchemaKind::Wizard));
        // Support files never surface as schemas.
        assert!(entries.iter().all(|e| !e.filename.starts_with("meta/")));
    }

    #[test]
    fn test_every_builtin_parses() {
        let registry = SchemaRegistry::new();
        for entry in registry.entries() {
            let loaded = registry.resolve(&entry.name).unwrap();
            assert_eq!(loaded.document.kind(), entry.kind, "{}", entry.name);
        }
    }

    #[test]
    fn test_resolve_unknown_name() {
        let registry = SchemaRegistry::new();
        let err = registry.resolve("does-not-exist").unwrap_err();
        assert!(matches!(err, SchemaError::NotFound { .. }));
    }

    #[test]
    fn test_sniff_kind_by_shape() {
        let form = "id: x\ntitle: X\nfields: []\n";
        assert!(matches!(
            parse_document(form, "unsuffixed.yaml").unwrap(),
            SchemaDocument::Form(_)
        ));
        let wizard = "id: x\ntitle: X\nsteps: []\n";
        assert!(matches!(
            parse_document(wizard, "unsuffixed.yaml").unwrap(),
            SchemaDocument::Wizard(_)
        ));
    }

    #[test]
    fn test_search_dir_shadows_builtin() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("new-project.form.yaml"),
            "id: shadowed\ntitle: Shadowed\nfields: []\n",
        )
        .unwrap();
        let registry = SchemaRegistry::with_search_dir(Some(tmp.path().to_path_buf()));
        let loaded = registry.resolve("new-project").unwrap();
        assert_eq!(loaded.document.id(), "shadowed");

        let entries = registry.entries();
        let matches: Vec<_> = entries.iter().filter(|e| e.name == "new-project").collect();
        assert_eq!(matches.len(), 1);
        assert_ne!(matches[0].origin, "builtin");
    }
}
