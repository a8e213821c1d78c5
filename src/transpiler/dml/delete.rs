//! DELETE SQL generation.

use crate::ast::*;
use crate::error::{CompileError, CompileResult};
use crate::transpiler::{ParamContext, Parent, Scope, conditions, joins};

/// Generate DELETE SQL. With `safe_mode` a missing or empty `where` is refused.
pub fn build_delete(
    query: &DeleteQuery,
    outer: &Scope<'_>,
    params: &mut ParamContext,
    safe_mode: bool,
) -> CompileResult<String> {
    let filter = query.filter.as_ref().filter(|f| !f.is_empty());
    if safe_mode && filter.is_none() {
        return Err(CompileError::missing(
            "where",
            format!("delete from '{}' (safe mode)", query.table),
        ));
    }
    let scope = outer.target(&query.table, query.alias.as_deref(), query.encryption.as_ref());

    let mut sql = String::from("DELETE FROM ");
    sql.push_str(&joins::table_ref(&query.table, query.alias.as_deref(), &scope, params));
    if let Some(filter) = filter {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions::condition(filter, Parent::None, query.junction, &scope, params)?);
    }
    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::transpiler::Dialect;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn delete(dialect: Dialect, input: serde_json::Value, safe_mode: bool) -> CompileResult<String> {
        let query = Parser::new().delete(&input)?;
        let mut params = ParamContext::new();
        build_delete(&query, &Scope::new(dialect, None), &mut params, safe_mode)
    }

    #[test]
    fn test_delete_with_alias_and_where() {
        let sql = delete(
            Dialect::Postgres,
            json!({"table": "sessions", "alias": "s", "where": {"expires": {"lt": "now"}}}),
            true,
        )
        .unwrap();
        assert_eq!(
            sql,
            "DELETE FROM \"sessions\" AS \"s\" WHERE \"s\".\"expires\" < NOW()"
        );
    }

    #[test]
    fn test_safe_mode_requires_where() {
        let err = delete(Dialect::MySql, json!({"table": "sessions"}), true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingParameter);

        let sql = delete(Dialect::MySql, json!({"table": "sessions"}), false).unwrap();
        assert_eq!(sql, "DELETE FROM ??");
    }
}
