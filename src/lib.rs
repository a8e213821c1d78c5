//! # sqlweave
//!
//! Compiles declarative JSON query trees into parameterized SQL for MySQL, PostgreSQL and
//! SQLite. Output is the SQL text plus the values for its placeholders, in order; nothing is
//! executed.
//!
//! ## Quick Example
//!
//! ```rust
//! use serde_json::json;
//! use sqlweave::prelude::*;
//!
//! let compiled = compile_select(
//!     &json!({
//!         "table": "users",
//!         "alias": "u",
//!         "select": [{"str": {"value": "name", "textCase": "upper", "as": "n"}}],
//!         "where": {"age": {"gt": 18}}
//!     }),
//!     Dialect::Postgres,
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     compiled.sql,
//!     "SELECT UPPER(\"u\".\"name\") AS \"n\" FROM \"users\" AS \"u\" WHERE \"u\".\"age\" > $1"
//! );
//! assert_eq!(compiled.values, vec![Value::Int(18)]);
//! ```
//!
//! ## Placeholders
//!
//! | Dialect    | Values     | Identifiers        |
//! |------------|------------|--------------------|
//! | mysql      | `?`        | `??` (bound)       |
//! | postgresql | `$1, $2…`  | inlined, quoted    |
//! | sqlite     | `?`        | inlined, quoted    |

pub mod ast;
pub mod config;
pub mod error;
pub mod transpiler;

use serde_json::Value as Json;

use config::{Compiler, CompilerConfig};
use error::CompileResult;
use transpiler::{Compiled, Dialect};

pub mod prelude {
    pub use crate::ast::Value;
    pub use crate::config::{Compiler, CompilerConfig};
    pub use crate::error::*;
    pub use crate::transpiler::{Compiled, DebugTrace, Dialect};
    pub use crate::{compile_delete, compile_insert_update, compile_select};
}

/// Compile a SELECT description with the default configuration.
pub fn compile_select(input: &Json, dialect: Dialect) -> CompileResult<Compiled> {
    Compiler::new(CompilerConfig::new(dialect)).select(input)
}

/// Compile an INSERT/UPDATE/upsert description with the default configuration.
pub fn compile_insert_update(input: &Json, dialect: Dialect) -> CompileResult<Compiled> {
    Compiler::new(CompilerConfig::new(dialect)).insert_update(input)
}

/// Compile a DELETE description with the default configuration (safe mode on).
pub fn compile_delete(input: &Json, dialect: Dialect) -> CompileResult<Compiled> {
    Compiler::new(CompilerConfig::new(dialect)).delete(input)
}
