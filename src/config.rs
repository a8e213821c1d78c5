//! Compiler configuration and the top-level [`Compiler`].
//!
//! ```toml
//! dialect = "postgresql"
//! safe_mode = true
//!
//! [encryption]
//! mode = "aes-256-cbc"
//! secret = "..."
//! iv = "..."
//! ```

use serde::Deserialize;
use serde_json::Value as Json;
use thiserror::Error;

use crate::ast::Parser;
use crate::error::CompileResult;
use crate::transpiler::dml::{delete::build_delete, select::build_select, write::build_insert_update};
use crate::transpiler::encryption::EncryptionConfig;
use crate::transpiler::{Compiled, Dialect, ParamContext, Scope};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid compiler config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Settings shared by every compile of one [`Compiler`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
    #[serde(default)]
    pub dialect: Dialect,
    /// Refuse DELETE without `where`.
    #[serde(default = "default_safe_mode")]
    pub safe_mode: bool,
    /// Model-level encryption defaults.
    #[serde(default)]
    pub encryption: Option<EncryptionConfig>,
}

fn default_safe_mode() -> bool {
    true
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            safe_mode: default_safe_mode(),
            encryption: None,
        }
    }
}

impl CompilerConfig {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Default::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Compiles query trees under one [`CompilerConfig`].
///
/// Holds no per-call state; a `Compiler` can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: CompilerConfig,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    fn scope(&self) -> Scope<'_> {
        Scope::new(self.config.dialect, self.config.encryption.as_ref())
    }

    fn finish(&self, kind: &str, sql: String, params: ParamContext, parser: Parser) -> Compiled {
        let compiled = Compiled::new(self.config.dialect, sql, params, parser.into_warnings());
        tracing::debug!(
            statement = kind,
            dialect = %compiled.dialect,
            values = compiled.value_count(),
            "compiled statement"
        );
        compiled
    }

    /// Compile a SELECT description.
    pub fn select(&self, input: &Json) -> CompileResult<Compiled> {
        let mut parser = Parser::new();
        let query = parser.select(input)?;
        let mut params = ParamContext::new();
        let sql = build_select(&query, &self.scope(), &mut params)?;
        Ok(self.finish("select", sql, params, parser))
    }

    /// Compile an INSERT, bulk INSERT, upsert or UPDATE description.
    pub fn insert_update(&self, input: &Json) -> CompileResult<Compiled> {
        let mut parser = Parser::new();
        let query = parser.write(input)?;
        let mut params = ParamContext::new();
        let sql = build_insert_update(&query, &self.scope(), &mut params)?;
        Ok(self.finish("insert_update", sql, params, parser))
    }

    /// Compile a DELETE description.
    pub fn delete(&self, input: &Json) -> CompileResult<Compiled> {
        let mut parser = Parser::new();
        let query = parser.delete(input)?;
        let mut params = ParamContext::new();
        let sql = build_delete(&query, &self.scope(), &mut params, self.config.safe_mode)?;
        Ok(self.finish("delete", sql, params, parser))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transpiler::encryption::EncryptionMode;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::from_toml_str("").unwrap();
        assert_eq!(config, CompilerConfig::default());
        assert_eq!(config.dialect, Dialect::MySql);
        assert!(config.safe_mode);
    }

    #[test]
    fn test_full_config() {
        let config = CompilerConfig::from_toml_str(
            r#"
            dialect = "postgres"
            safe_mode = false

            [encryption]
            mode = "aes-128-ecb"
            secret = "model-key"
            "#,
        )
        .unwrap();
        assert_eq!(config.dialect, Dialect::Postgres);
        assert!(!config.safe_mode);
        let encryption = config.encryption.unwrap();
        assert_eq!(encryption.mode, Some(EncryptionMode::Aes128Ecb));
        assert_eq!(encryption.secret.as_deref(), Some("model-key"));
    }

    #[test]
    fn test_unknown_dialect_rejected() {
        let err = CompilerConfig::from_toml_str("dialect = \"oracle\"").unwrap_err();
        assert!(err.to_string().starts_with("Invalid compiler config"));
    }
}
