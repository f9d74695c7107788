//! CLI command implementations

pub mod completions;
pub mod list;
pub mod run;
pub mod show;
pub mod validate;
pub mod wizard;
