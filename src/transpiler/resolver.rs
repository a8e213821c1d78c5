//! Identifier & literal resolution.
//!
//! The only place caller tokens become SQL text. Constants and validated star tokens are
//! inlined; everything else is either a bound value or an identifier reference.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use super::{ParamContext, Scope, conditions, wrappers};
use crate::ast::{Expr, Junction, Value};
use crate::error::{CompileError, CompileResult};
use crate::transpiler::{Dialect, Parent};

/// Fixed SQL constants, spelled per dialect.
fn constant(token: &str, dialect: Dialect) -> Option<&'static str> {
    let sqlite = dialect == Dialect::Sqlite;
    Some(match token {
        "now" if sqlite => "DATETIME('now')",
        "now" => "NOW()",
        "pi" => "PI()",
        "currentDate" => "CURRENT_DATE",
        "currentTime" => "CURRENT_TIME",
        "currentTimestamp" => "CURRENT_TIMESTAMP",
        "localTime" if sqlite => "TIME('now', 'localtime')",
        "localTime" => "LOCALTIME",
        "localTimestamp" if sqlite => "DATETIME('now', 'localtime')",
        "localTimestamp" => "LOCALTIMESTAMP",
        "utcTimestamp" => match dialect {
            Dialect::MySql => "UTC_TIMESTAMP()",
            Dialect::Postgres => "(NOW() AT TIME ZONE 'UTC')",
            Dialect::Sqlite => "DATETIME('now')",
        },
        _ => return None,
    })
}

fn is_null_token(token: &str) -> bool {
    matches!(token, "null" | "NULL")
}

/// JSON `null` or a `"null"`/`"NULL"` token.
pub(crate) fn is_null(expr: &Expr) -> bool {
    match expr {
        Expr::Null => true,
        Expr::Text(token) => is_null_token(token),
        _ => false,
    }
}

/// Plain decimal notation only; `"nan"` or `"inf"` are not numbers here.
fn is_numeric(token: &str) -> bool {
    let digits = token.strip_prefix(['-', '+']).unwrap_or(token);
    !digits.is_empty()
        && digits.chars().any(|c| c.is_ascii_digit())
        && digits
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '-' | '+'))
        && token.parse::<f64>().is_ok()
}

fn is_date(token: &str) -> bool {
    NaiveDate::parse_from_str(token, "%Y-%m-%d").is_ok()
        || NaiveDateTime::parse_from_str(token, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(token, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveTime::parse_from_str(token, "%H:%M:%S").is_ok()
        || DateTime::parse_from_rfc3339(token).is_ok()
}

fn is_name(part: &str) -> bool {
    !part.is_empty() && part.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Qualify with the active alias unless already dotted.
fn qualify(token: &str, scope: &Scope<'_>) -> String {
    match scope.alias {
        Some(alias) if !token.contains('.') => format!("{}.{}", alias, token),
        _ => token.to_string(),
    }
}

/// Resolve a token in column position (select items, keys, wrapper arguments).
pub fn column_token(token: &str, scope: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    let generator = scope.generator;
    if let Some(sql) = constant(token, scope.dialect) {
        return Ok(sql.to_string());
    }
    if token.contains('*') {
        return star(token, scope);
    }
    if is_null_token(token) {
        return Ok("NULL".to_string());
    }
    if let Some(literal) = token.strip_prefix('#') {
        return Ok(params.add_param(Value::String(literal.to_string()), generator));
    }
    if is_numeric(token) || is_date(token) {
        return Ok(params.add_param(Value::String(token.to_string()), generator));
    }
    Ok(params.add_identifier(&qualify(token, scope), generator))
}

/// `*` or `name.*`; any other token with a star is rejected.
fn star(token: &str, scope: &Scope<'_>) -> CompileResult<String> {
    if token == "*" {
        return Ok("*".to_string());
    }
    match token.strip_suffix(".*") {
        Some(table) if is_name(table) => Ok(format!("{}.*", scope.generator.quote_identifier(table))),
        _ => Err(CompileError::invalid(
            token,
            "only '*' and 'name.*' may contain a star",
        )),
    }
}

/// Resolve a token in value position (comparison right-hand sides, branch results).
///
/// Text is bound verbatim unless it is a constant, a null token, or `alias.column` with a
/// known alias.
pub fn value_token(token: &str, scope: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    let generator = scope.generator;
    if let Some(sql) = constant(token, scope.dialect) {
        return Ok(sql.to_string());
    }
    if is_null_token(token) {
        return Ok("NULL".to_string());
    }
    if let Some(literal) = token.strip_prefix('#') {
        return Ok(params.add_param(Value::String(literal.to_string()), generator));
    }
    if let Some((alias, column)) = token.split_once('.') {
        if scope.is_known_alias(alias) && is_name(column) {
            return Ok(params.add_identifier(token, generator));
        }
    }
    Ok(params.add_param(Value::String(token.to_string()), generator))
}

/// Compile an expression in column position.
pub fn column(expr: &Expr, scope: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    match expr {
        Expr::Text(token) => column_token(token, scope, params),
        other => expression(other, scope, params),
    }
}

/// Compile an expression in value position.
pub fn value(expr: &Expr, scope: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    match expr {
        Expr::Text(token) => value_token(token, scope, params),
        other => expression(other, scope, params),
    }
}

fn expression(expr: &Expr, scope: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    match expr {
        Expr::Null => Ok("NULL".to_string()),
        Expr::Bool(b) => Ok(params.add_param(Value::Bool(*b), scope.generator)),
        Expr::Number(n) => Ok(params.add_param(
            Value::from_json(&serde_json::Value::Number(n.clone())),
            scope.generator,
        )),
        Expr::Text(token) => value_token(token, scope, params),
        Expr::Wrapper(wrapper) => wrappers::compile(wrapper, scope, params, wrappers::Position::Inline),
        Expr::Condition(condition) => {
            conditions::grouped(condition, Parent::None, Junction::And, scope, params)
        }
        Expr::List(_) => Err(CompileError::invalid(
            "value",
            "a list is only allowed as an IN operand or argument list",
        )),
    }
}
