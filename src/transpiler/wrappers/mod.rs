//! Wrapper function compilers.
//!
//! Each wrapper compiles its core expression (value, decrypt, cast, transform chain);
//! [`compile`] then applies the shared finishing steps: `compare` and `AS alias`.

pub mod aggregate;
pub mod branch;
pub mod concat;
pub mod date;
pub mod numeric;
pub mod string;

use super::encryption;
use super::{ParamContext, Parent, Scope, conditions, joins, json, resolver};
use crate::ast::*;
use crate::error::{CompileError, CompileResult};

/// Where the wrapper is emitted; only select items carry their alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Select,
    Inline,
    Condition,
}

pub fn compile(
    wrapper: &Wrapper,
    scope: &Scope<'_>,
    params: &mut ParamContext,
    position: Position,
) -> CompileResult<String> {
    tracing::trace!(wrapper = wrapper.key(), ?position, "compiling wrapper");
    if let Wrapper::And(_) | Wrapper::Or(_) | Wrapper::Between(_) = wrapper {
        let cond = Condition {
            entries: vec![Entry::Wrapper(wrapper.clone())],
        };
        return conditions::condition(&cond, Parent::None, Junction::And, scope, params);
    }

    let sql = match compare_of(wrapper) {
        Some(cond) => {
            let emit = |p: &mut ParamContext| core(wrapper, scope, p);
            conditions::grouped(cond, Parent::Emit(&emit), Junction::And, scope, params)?
        }
        None => core(wrapper, scope, params)?,
    };

    Ok(match (alias_of(wrapper), position) {
        (Some(alias), Position::Select) => {
            format!("{} AS {}", sql, params.add_alias(alias, scope.generator))
        }
        _ => sql,
    })
}

/// Value expression of a wrapper, before `compare` and alias.
fn core(wrapper: &Wrapper, scope: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    match wrapper {
        Wrapper::Str(op) => string::compile(op, scope, params),
        Wrapper::Num(op) => numeric::compile(op, scope, params),
        Wrapper::Date(op) => date::compile(op, scope, params),
        Wrapper::Concat(op) => concat::compile(op, scope, params),
        Wrapper::If(op) => branch::compile_if(op, scope, params),
        Wrapper::Case(op) => branch::compile_case(op, scope, params),
        Wrapper::Json(op) | Wrapper::Array(op) => json::compile(op, scope, params),
        Wrapper::Refer(op) => joins::subquery(&op.query, scope, params),
        Wrapper::Aggregate(kind, op) => aggregate::compile(*kind, op, scope, params),
        Wrapper::And(_) | Wrapper::Or(_) | Wrapper::Between(_) => Err(CompileError::invalid(
            wrapper.key(),
            "combinators do not produce a value",
        )),
    }
}

fn compare_of(wrapper: &Wrapper) -> Option<&Condition> {
    match wrapper {
        Wrapper::Str(op) => op.operand.compare.as_ref(),
        Wrapper::Num(op) => op.operand.compare.as_ref(),
        Wrapper::Date(op) => op.operand.compare.as_ref(),
        Wrapper::Concat(op) => op.compare.as_ref(),
        Wrapper::If(op) => op.compare.as_ref(),
        Wrapper::Case(op) => op.compare.as_ref(),
        Wrapper::Json(op) | Wrapper::Array(op) => op.compare.as_ref(),
        Wrapper::Aggregate(_, op) => op.compare.as_ref(),
        Wrapper::Refer(_) | Wrapper::And(_) | Wrapper::Or(_) | Wrapper::Between(_) => None,
    }
}

pub(crate) fn alias_of(wrapper: &Wrapper) -> Option<&str> {
    match wrapper {
        Wrapper::Str(op) => op.operand.alias.as_deref(),
        Wrapper::Num(op) => op.operand.alias.as_deref(),
        Wrapper::Date(op) => op.operand.alias.as_deref(),
        Wrapper::Concat(op) => op.alias.as_deref(),
        Wrapper::If(op) => op.alias.as_deref(),
        Wrapper::Case(op) => op.alias.as_deref(),
        Wrapper::Json(op) | Wrapper::Array(op) => op.alias.as_deref(),
        Wrapper::Refer(op) => op.alias.as_deref(),
        Wrapper::Aggregate(_, op) => op.alias.as_deref(),
        Wrapper::And(_) | Wrapper::Or(_) | Wrapper::Between(_) => None,
    }
}

pub fn has_compare(wrapper: &Wrapper) -> bool {
    compare_of(wrapper).is_some()
}

/// Resolve, decrypt and cast the operand of a value wrapper.
pub(crate) fn operand(op: &Operand, scope: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    let scope = scope.with_call(op.encryption.as_ref());
    let mut sql = resolver::column(&op.value, &scope, params)?;
    if let Some(column) = &op.decrypt {
        let config = encryption::resolve_in_scope(Some(column), &scope)?;
        sql = encryption::decrypt(&sql, &config, &scope, params)?;
    }
    match op.cast {
        Some(cast) => cast_to(&sql, cast, &scope),
        None => Ok(sql),
    }
}

pub(crate) fn cast_to(sql: &str, cast: CastType, scope: &Scope<'_>) -> CompileResult<String> {
    let target = scope.generator.cast_type(cast).ok_or_else(|| {
        CompileError::unsupported(format!("cast to {:?}", cast).to_lowercase(), scope.dialect)
    })?;
    Ok(format!("CAST({} AS {})", sql, target))
}

/// Compile each argument in column position, in order.
pub(crate) fn arguments(values: &[Expr], scope: &Scope<'_>, params: &mut ParamContext) -> CompileResult<Vec<String>> {
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        out.push(resolver::column(value, scope, params)?);
    }
    Ok(out)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::transpiler::Dialect;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    pub(crate) fn select_item(dialect: Dialect, input: serde_json::Value) -> (String, serde_json::Value) {
        let expr = Parser::new().expr(&input).unwrap();
        let Expr::Wrapper(wrapper) = expr else {
            panic!("not a wrapper: {}", input);
        };
        let mut scope = Scope::new(dialect, None);
        scope.alias = Some("u");
        scope.known_aliases = vec!["users", "u"];
        let mut params = ParamContext::new();
        let sql = compile(&wrapper, &scope, &mut params, Position::Select).unwrap();
        (sql, serde_json::to_value(&params.params).unwrap())
    }

    pub(crate) fn select_error(dialect: Dialect, input: serde_json::Value) -> CompileError {
        let expr = Parser::new().expr(&input).unwrap();
        let Expr::Wrapper(wrapper) = expr else {
            panic!("not a wrapper: {}", input);
        };
        let scope = Scope::new(dialect, None);
        let mut params = ParamContext::new();
        compile(&wrapper, &scope, &mut params, Position::Select).unwrap_err()
    }

    #[test]
    fn test_alias_bound_on_mysql() {
        let (sql, values) = select_item(
            Dialect::MySql,
            json!({"str": {"value": "name", "textCase": "upper", "as": "n"}}),
        );
        assert_eq!(sql, "UPPER(??) AS ?");
        assert_eq!(values, json!(["u.name", "n"]));
    }

    #[test]
    fn test_compare_reemits_core() {
        let (sql, values) = select_item(
            Dialect::Postgres,
            json!({"num": {"value": "price", "multiplyBy": 2, "compare": {"gt": 10, "lt": 20}}}),
        );
        assert_eq!(
            sql,
            "((\"u\".\"price\" * $1) > $2 AND (\"u\".\"price\" * $3) < $4)"
        );
        assert_eq!(values, json!([2, 10, 2, 20]));
    }

    #[test]
    fn test_cast_support_per_dialect() {
        let (sql, _) = select_item(Dialect::Postgres, json!({"str": {"value": "id", "cast": "text"}}));
        assert_eq!(sql, "CAST(\"u\".\"id\" AS TEXT)");
        let err = select_error(Dialect::MySql, json!({"str": {"value": "id", "cast": "boolean"}}));
        assert_eq!(err.kind(), crate::error::ErrorKind::UnsupportedByDialect);
    }

    #[test]
    fn test_decrypt_uses_model_config() {
        let model = crate::transpiler::encryption::EncryptionConfig {
            secret: Some("k".into()),
            iv: Some("v".into()),
            ..Default::default()
        };
        let expr = Parser::new()
            .expr(&json!({"str": {"value": "ssn", "decrypt": true}}))
            .unwrap();
        let Expr::Wrapper(wrapper) = expr else {
            panic!("not a wrapper");
        };
        let scope = Scope::new(Dialect::MySql, Some(&model));
        let mut params = ParamContext::new();
        let sql = compile(&wrapper, &scope, &mut params, Position::Select).unwrap();
        assert_eq!(sql, "AES_DECRYPT(??, UNHEX(SHA2(?, 512)), ?)");
        assert_eq!(
            serde_json::to_value(&params.params).unwrap(),
            json!(["ssn", "k", "v"])
        );
        assert_eq!(params.block_mode, Some(encryption::EncryptionMode::Aes256Cbc));
    }
}
