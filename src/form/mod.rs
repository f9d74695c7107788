//! Form engine - schema compilation and live sessions

pub mod compiler;
pub mod session;

pub use compiler::{compile, CompiledForm, Verdict};
pub use session::{hidden_fields, FormSession};
