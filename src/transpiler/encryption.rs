//! Encryption config resolution and AES primitive emission.
//!
//! Settings merge per field with precedence column > call > query > model.

use serde::Deserialize;

use super::{ParamContext, Scope};
use crate::ast::Value;
use crate::error::{CompileError, CompileResult};
use crate::transpiler::Dialect;

/// Partial encryption settings as given at any one level.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncryptionConfig {
    pub mode: Option<EncryptionMode>,
    pub secret: Option<String>,
    pub iv: Option<String>,
    pub sha: Option<u16>,
}

impl EncryptionConfig {
    /// Fill every unset field from `lower`.
    pub fn or(&self, lower: &EncryptionConfig) -> EncryptionConfig {
        EncryptionConfig {
            mode: self.mode.or(lower.mode),
            secret: self.secret.clone().or_else(|| lower.secret.clone()),
            iv: self.iv.clone().or_else(|| lower.iv.clone()),
            sha: self.sha.or(lower.sha),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum EncryptionMode {
    #[serde(rename = "aes-128-ecb")]
    Aes128Ecb,
    #[serde(rename = "aes-192-ecb")]
    Aes192Ecb,
    #[serde(rename = "aes-256-ecb")]
    Aes256Ecb,
    #[serde(rename = "aes-128-cbc")]
    Aes128Cbc,
    #[serde(rename = "aes-192-cbc")]
    Aes192Cbc,
    #[serde(rename = "aes-256-cbc")]
    #[default]
    Aes256Cbc,
}

impl EncryptionMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Aes128Ecb => "aes-128-ecb",
            Self::Aes192Ecb => "aes-192-ecb",
            Self::Aes256Ecb => "aes-256-ecb",
            Self::Aes128Cbc => "aes-128-cbc",
            Self::Aes192Cbc => "aes-192-cbc",
            Self::Aes256Cbc => "aes-256-cbc",
        }
    }

    pub fn requires_iv(&self) -> bool {
        matches!(self, Self::Aes128Cbc | Self::Aes192Cbc | Self::Aes256Cbc)
    }

    /// pgcrypto `cipher-algo` for the key size.
    fn pg_cipher(&self) -> &'static str {
        match self {
            Self::Aes128Ecb | Self::Aes128Cbc => "aes128",
            Self::Aes192Ecb | Self::Aes192Cbc => "aes192",
            Self::Aes256Ecb | Self::Aes256Cbc => "aes256",
        }
    }
}

impl std::fmt::Display for EncryptionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

const SHA_BITS: [u16; 4] = [224, 256, 384, 512];
const DEFAULT_SHA: u16 = 512;

/// Fully merged and validated settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEncryption {
    pub mode: EncryptionMode,
    pub secret: String,
    pub iv: Option<String>,
    pub sha: u16,
}

/// Merge the four levels and validate the result.
pub fn resolve(
    column: Option<&EncryptionConfig>,
    call: Option<&EncryptionConfig>,
    query: Option<&EncryptionConfig>,
    model: Option<&EncryptionConfig>,
) -> CompileResult<ResolvedEncryption> {
    let merged = [column, call, query, model]
        .into_iter()
        .flatten()
        .fold(EncryptionConfig::default(), |acc, level| acc.or(level));

    let mode = merged.mode.unwrap_or_default();
    let secret = merged
        .secret
        .ok_or_else(|| CompileError::missing("secret", "encryption"))?;
    let iv = match (mode.requires_iv(), merged.iv) {
        (true, None) => {
            return Err(CompileError::missing(
                "iv",
                format!("encryption ({})", mode),
            ));
        }
        (true, Some(iv)) => Some(iv),
        // ecb modes take no init vector
        (false, _) => None,
    };
    let sha = merged.sha.unwrap_or(DEFAULT_SHA);
    if !SHA_BITS.contains(&sha) {
        return Err(CompileError::invalid(
            "sha",
            format!("{} is not one of 224, 256, 384, 512", sha),
        ));
    }

    Ok(ResolvedEncryption {
        mode,
        secret,
        iv,
        sha,
    })
}

/// Resolve against the scope's call/query/model layers.
pub fn resolve_in_scope(
    column: Option<&EncryptionConfig>,
    scope: &Scope<'_>,
) -> CompileResult<ResolvedEncryption> {
    let layers = &scope.encryption;
    resolve(column, layers.call, layers.query, layers.model)
}

/// Emit `AES_DECRYPT`/`pgp_sym_decrypt` around an already compiled expression.
pub fn decrypt(
    expr: &str,
    config: &ResolvedEncryption,
    scope: &Scope<'_>,
    params: &mut ParamContext,
) -> CompileResult<String> {
    primitive(expr, config, scope, params, Direction::Decrypt)
}

/// Emit `AES_ENCRYPT`/`pgp_sym_encrypt` around an already compiled expression.
pub fn encrypt(
    expr: &str,
    config: &ResolvedEncryption,
    scope: &Scope<'_>,
    params: &mut ParamContext,
) -> CompileResult<String> {
    primitive(expr, config, scope, params, Direction::Encrypt)
}

#[derive(Clone, Copy)]
enum Direction {
    Encrypt,
    Decrypt,
}

fn primitive(
    expr: &str,
    config: &ResolvedEncryption,
    scope: &Scope<'_>,
    params: &mut ParamContext,
    direction: Direction,
) -> CompileResult<String> {
    let generator = scope.generator;
    match scope.dialect {
        Dialect::MySql => {
            params.require_block_mode(config.mode)?;
            let function = match direction {
                Direction::Encrypt => "AES_ENCRYPT",
                Direction::Decrypt => "AES_DECRYPT",
            };
            let secret = params.add_param(Value::String(config.secret.clone()), generator);
            let mut sql = format!(
                "{}({}, UNHEX(SHA2({}, {}))",
                function, expr, secret, config.sha
            );
            if let Some(iv) = &config.iv {
                let iv = params.add_param(Value::String(iv.clone()), generator);
                sql.push_str(&format!(", {}", iv));
            }
            sql.push(')');
            Ok(sql)
        }
        Dialect::Postgres => {
            let secret = params.add_param(Value::String(config.secret.clone()), generator);
            let options = format!("'cipher-algo={}'", config.mode.pg_cipher());
            Ok(match direction {
                Direction::Encrypt => format!(
                    "pgp_sym_encrypt(CAST({} AS TEXT), {}, {})",
                    expr, secret, options
                ),
                Direction::Decrypt => format!(
                    "pgp_sym_decrypt(CAST({} AS BYTEA), {}, {})",
                    expr, secret, options
                ),
            })
        }
        Dialect::Sqlite => Err(CompileError::unsupported(
            match direction {
                Direction::Encrypt => "encrypt",
                Direction::Decrypt => "decrypt",
            },
            scope.dialect,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn config(mode: Option<EncryptionMode>, secret: Option<&str>, iv: Option<&str>) -> EncryptionConfig {
        EncryptionConfig {
            mode,
            secret: secret.map(String::from),
            iv: iv.map(String::from),
            sha: None,
        }
    }

    #[test]
    fn test_precedence_column_query_model() {
        let column = config(None, Some("a"), None);
        let query = config(None, Some("b"), Some("x"));
        let model = config(Some(EncryptionMode::Aes256Cbc), Some("c"), None);

        let resolved = resolve(Some(&column), None, Some(&query), Some(&model)).unwrap();
        assert_eq!(
            resolved,
            ResolvedEncryption {
                mode: EncryptionMode::Aes256Cbc,
                secret: "a".into(),
                iv: Some("x".into()),
                sha: 512,
            }
        );
    }

    #[test]
    fn test_call_level_sits_between_column_and_query() {
        let call = config(None, Some("call"), Some("iv-call"));
        let query = config(None, Some("query"), Some("iv-query"));
        let resolved = resolve(None, Some(&call), Some(&query), None).unwrap();
        assert_eq!(resolved.secret, "call");
        assert_eq!(resolved.iv.as_deref(), Some("iv-call"));
    }

    #[test]
    fn test_cbc_requires_iv() {
        let column = config(Some(EncryptionMode::Aes128Cbc), Some("s"), None);
        let err = resolve(Some(&column), None, None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingParameter);
    }

    #[test]
    fn test_ecb_drops_iv() {
        let column = config(Some(EncryptionMode::Aes128Ecb), Some("s"), Some("ignored"));
        let resolved = resolve(Some(&column), None, None, None).unwrap();
        assert_eq!(resolved.iv, None);
    }

    #[test]
    fn test_secret_required() {
        let err = resolve(None, None, None, None).unwrap_err();
        assert_eq!(err, CompileError::missing("secret", "encryption"));
    }

    #[test]
    fn test_sha_validated() {
        let mut column = config(Some(EncryptionMode::Aes128Ecb), Some("s"), None);
        column.sha = Some(128);
        let err = resolve(Some(&column), None, None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_mode_names_deserialize() {
        let cfg: EncryptionConfig =
            serde_json::from_value(serde_json::json!({"mode": "aes-256-ecb", "secret": "k"}))
                .unwrap();
        assert_eq!(cfg.mode, Some(EncryptionMode::Aes256Ecb));
        assert!(
            serde_json::from_value::<EncryptionConfig>(serde_json::json!({"mode": "des"})).is_err()
        );
    }
}
