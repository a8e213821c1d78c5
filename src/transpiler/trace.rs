//! Structured debug trace of a compiled statement.

use serde::Serialize;

use super::{Compiled, Dialect, Statement};
use crate::ast::Value;

/// Serializable view of a [`Compiled`] statement; rendering it is up to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugTrace {
    pub dialect: Dialect,
    pub sql: String,
    pub values: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub preamble: Vec<Statement>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Compiled {
    pub fn trace(&self) -> DebugTrace {
        DebugTrace {
            dialect: self.dialect,
            sql: self.sql.clone(),
            values: self.values.clone(),
            preamble: self.preamble.clone(),
            warnings: self.warnings.clone(),
        }
    }
}
