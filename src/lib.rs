//! fitforms: schema-driven forms and wizards for the fitting workbench
//!
//! Declarative YAML form and wizard documents are compiled into runtime
//! validators, bound to live input sessions, and sequenced into
//! multi-step flows.

pub mod cli;
pub mod core;
pub mod form;
pub mod schema;
pub mod wizard;
pub mod yaml;
