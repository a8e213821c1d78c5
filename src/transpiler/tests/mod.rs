//! Transpiler test modules.
//!
//! Tests are organized by category:
//! - `core`: SELECT, INSERT, UPDATE, DELETE through the public entry points
//! - `dialects`: placeholder conventions checked over every dialect
//! - `features`: subqueries, JSON, encryption, warnings and traces

mod features;

use serde_json::Value as Json;

use crate::transpiler::Compiled;

/// Bound values as JSON, for compact assertions.
pub(super) fn values(compiled: &Compiled) -> Json {
    serde_json::to_value(&compiled.values).unwrap()
}
