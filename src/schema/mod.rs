//! Schema system - declarative documents, registry, and document validation

pub mod forms;
pub mod registry;
pub mod validator;

pub use forms::{FieldSchema, FieldType, FormSchema, RuleType, ValidationRule, WizardSchema};
pub use registry::{LoadedSchema, SchemaDocument, SchemaKind, SchemaRegistry};
pub use validator::{DocumentError, DocumentValidator, LintReport};
