//! SQL Transpiler for the typed query tree.
//!
//! Every sub-compiler returns its SQL fragment and appends the values it binds to one shared
//! [`ParamContext`], so placeholder order always matches value order.

pub mod conditions;
pub mod date_pattern;
pub mod dialect;
pub mod dml;
pub mod encryption;
pub mod joins;
pub mod json;
pub mod resolver;
pub mod sql;
pub mod trace;
pub mod traits;
pub mod wrappers;

#[cfg(test)]
mod tests;

use serde::Serialize;

use crate::ast::{SelectQuery, Value};
use crate::error::{CompileError, CompileResult};
pub use dialect::Dialect;
use encryption::{EncryptionConfig, EncryptionMode};
pub use trace::DebugTrace;
pub use traits::{SqlGenerator, escape_identifier};

/// Context for parameterized query building.
#[derive(Debug, Default)]
pub struct ParamContext {
    /// Current parameter index (1-based for Postgres $1, $2, etc.)
    pub index: usize,
    /// Collected parameter values in order
    pub params: Vec<Value>,
    /// AES block mode the emitted mysql primitives rely on.
    pub block_mode: Option<EncryptionMode>,
}

impl ParamContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value and return the placeholder for it.
    pub fn add_param(&mut self, value: Value, generator: &dyn SqlGenerator) -> String {
        self.index += 1;
        self.params.push(value);
        generator.placeholder(self.index)
    }

    /// Reference an identifier path: bound under `??` on mysql, inlined quoted elsewhere.
    pub fn add_identifier(&mut self, path: &str, generator: &dyn SqlGenerator) -> String {
        match generator.identifier_placeholder() {
            Some(placeholder) => {
                self.index += 1;
                self.params.push(Value::Identifier(path.to_string()));
                placeholder.to_string()
            }
            None => generator.quote_identifier(path),
        }
    }

    /// Reference a column alias: bound as a value on mysql, inlined quoted elsewhere.
    pub fn add_alias(&mut self, name: &str, generator: &dyn SqlGenerator) -> String {
        if generator.binds_aliases() {
            self.add_param(Value::String(name.to_string()), generator)
        } else {
            generator.quote_name(name)
        }
    }

    /// Position of the next value, for a later [`insert_param`](Self::insert_param).
    pub fn mark(&self) -> usize {
        self.params.len()
    }

    /// Bind a value that is emitted textually before values already pushed since `mark`.
    ///
    /// Only valid for positional dialects, where placeholders carry no index.
    pub fn insert_param(&mut self, mark: usize, value: Value, generator: &dyn SqlGenerator) -> String {
        debug_assert!(mark <= self.params.len());
        self.index += 1;
        self.params.insert(mark, value);
        generator.placeholder(self.index)
    }

    /// Record the AES block mode; one statement can only run under one session mode.
    pub fn require_block_mode(&mut self, mode: EncryptionMode) -> CompileResult<()> {
        match self.block_mode {
            Some(current) if current != mode => Err(CompileError::invalid(
                "encryption.mode",
                format!(
                    "'{}' conflicts with '{}' already used in this statement",
                    mode, current
                ),
            )),
            _ => {
                self.block_mode = Some(mode);
                Ok(())
            }
        }
    }
}

/// Encryption settings inherited from outside the column.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncryptionLayers<'a> {
    pub call: Option<&'a EncryptionConfig>,
    pub query: Option<&'a EncryptionConfig>,
    pub model: Option<&'a EncryptionConfig>,
}

/// Immutable compile context, shadowed (never mutated) on the way down.
#[derive(Clone)]
pub struct Scope<'a> {
    pub dialect: Dialect,
    pub generator: &'static dyn SqlGenerator,
    /// Qualifies bare column tokens.
    pub alias: Option<&'a str>,
    /// Aliases and table names of this query, its joins and every enclosing query.
    pub known_aliases: Vec<&'a str>,
    pub encryption: EncryptionLayers<'a>,
}

impl<'a> Scope<'a> {
    pub fn new(dialect: Dialect, model: Option<&'a EncryptionConfig>) -> Self {
        Self {
            dialect,
            generator: dialect.generator(),
            alias: None,
            known_aliases: Vec::new(),
            encryption: EncryptionLayers {
                model,
                ..Default::default()
            },
        }
    }

    /// Scope for the body of `query`: its alias qualifies bare columns, enclosing
    /// aliases stay referable.
    pub fn enter<'b>(&self, query: &'b SelectQuery) -> Scope<'b>
    where
        'a: 'b,
    {
        let mut scope: Scope<'b> = self.clone();
        scope.alias = query.alias.as_deref();
        scope.known_aliases.push(query.table.as_str());
        scope.known_aliases.extend(query.alias.as_deref());
        for join in &query.joins {
            scope.known_aliases.push(join.query.table.as_str());
            scope.known_aliases.extend(join.query.alias.as_deref());
        }
        if let Some(config) = &query.encryption {
            scope.encryption.query = Some(config);
        }
        scope
    }

    /// Scope for a bare table target (writes, deletes).
    pub fn target<'b>(&self, table: &'b str, alias: Option<&'b str>, encryption: Option<&'b EncryptionConfig>) -> Scope<'b>
    where
        'a: 'b,
    {
        let mut scope: Scope<'b> = self.clone();
        scope.alias = alias;
        scope.known_aliases.push(table);
        scope.known_aliases.extend(alias);
        if encryption.is_some() {
            scope.encryption.query = encryption;
        }
        scope
    }

    /// Apply a wrapper's encryption override.
    pub fn with_call<'b>(&self, call: Option<&'b EncryptionConfig>) -> Scope<'b>
    where
        'a: 'b,
    {
        let mut scope: Scope<'b> = self.clone();
        if call.is_some() {
            scope.encryption.call = call;
        }
        scope
    }

    pub fn is_known_alias(&self, name: &str) -> bool {
        self.known_aliases.iter().any(|known| *known == name)
    }
}

/// Left operand of the comparisons in a nested condition map.
///
/// Re-emitted for every comparison so each occurrence binds its own values.
#[derive(Clone, Copy)]
pub enum Parent<'p> {
    None,
    Column(&'p str),
    Emit(&'p dyn Fn(&mut ParamContext) -> CompileResult<String>),
}

/// A statement with its bound values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub sql: String,
    pub values: Vec<Value>,
}

/// Output of a top-level compile.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub dialect: Dialect,
    pub sql: String,
    pub values: Vec<Value>,
    /// Session statements to run first, on the same connection.
    pub preamble: Vec<Statement>,
    /// Optional clauses dropped because of their shape.
    pub warnings: Vec<String>,
}

impl Compiled {
    pub(crate) fn new(dialect: Dialect, sql: String, params: ParamContext, warnings: Vec<String>) -> Self {
        let preamble = params
            .block_mode
            .map(|mode| Statement {
                sql: "SET SESSION block_encryption_mode = ?".to_string(),
                values: vec![Value::String(mode.name().to_string())],
            })
            .into_iter()
            .collect();
        Self {
            dialect,
            sql,
            values: params.params,
            preamble,
            warnings,
        }
    }

    /// Number of bound values, one per placeholder in `sql`.
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.values)
    }
}

#[cfg(test)]
mod context_tests {
    use super::*;

    #[test]
    fn test_placeholders_follow_dialect() {
        let mut params = ParamContext::new();
        let pg = Dialect::Postgres.generator();
        assert_eq!(params.add_param(Value::Int(1), pg), "$1");
        assert_eq!(params.add_identifier("u.age", pg), "\"u\".\"age\"");
        assert_eq!(params.add_param(Value::Int(2), pg), "$2");
        assert_eq!(params.params.len(), 2);

        let mut params = ParamContext::new();
        let mysql = Dialect::MySql.generator();
        assert_eq!(params.add_identifier("u.age", mysql), "??");
        assert_eq!(params.add_alias("n", mysql), "?");
        assert_eq!(
            params.params,
            vec![Value::Identifier("u.age".into()), Value::String("n".into())]
        );
    }

    #[test]
    fn test_insert_param_keeps_textual_order() {
        let generator = Dialect::Sqlite.generator();
        let mut params = ParamContext::new();
        params.add_param(Value::Int(1), generator);
        let mark = params.mark();
        params.add_param(Value::Int(3), generator);
        params.insert_param(mark, Value::Int(2), generator);
        assert_eq!(params.params, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn test_block_mode_conflict() {
        let mut params = ParamContext::new();
        params.require_block_mode(EncryptionMode::Aes256Cbc).unwrap();
        params.require_block_mode(EncryptionMode::Aes256Cbc).unwrap();
        assert!(params.require_block_mode(EncryptionMode::Aes128Ecb).is_err());
    }
}
