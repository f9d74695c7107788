//! YAML loading diagnostics

pub mod diagnostics;

pub use diagnostics::{YamlError, YamlSyntaxError};
