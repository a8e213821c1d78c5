//! Join clauses, table references and `refer` subqueries.

use super::dml::select::build_select;
use super::{ParamContext, Parent, Scope, conditions, resolver};
use crate::ast::*;
use crate::error::{CompileError, CompileResult};

/// `table [AS alias]`; both are identifiers.
pub fn table_ref(table: &str, alias: Option<&str>, scope: &Scope<'_>, params: &mut ParamContext) -> String {
    let generator = scope.generator;
    let table = params.add_identifier(table, generator);
    match alias {
        Some(alias) => {
            let alias = params.add_identifier(alias, generator);
            format!("{} AS {}", table, alias)
        }
        None => table,
    }
}

/// A parenthesized SELECT.
pub fn subquery(query: &SelectQuery, scope: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    Ok(format!("({})", build_select(query, scope, params)?))
}

/// One join clause; `parent` is the qualifier of the query being joined onto.
pub fn compile_join(
    join: &JoinSpec,
    parent: &str,
    scope: &Scope<'_>,
    params: &mut ParamContext,
) -> CompileResult<String> {
    tracing::trace!(table = %join.query.table, join_type = ?join.join_type, "compiling join");
    let query = &join.query;

    let target = if join.is_derived() {
        let alias = query
            .alias
            .as_deref()
            .ok_or_else(|| CompileError::missing("alias", format!("derived join '{}'", query.table)))?;
        let body = subquery(query, scope, params)?;
        format!("{} AS {}", body, params.add_identifier(alias, scope.generator))
    } else {
        table_ref(&query.table, query.alias.as_deref(), scope, params)
    };

    let mut sql = format!("{} {}", join.join_type.keyword(), target);
    match &join.using {
        Some(Using::Columns(columns)) => {
            let columns = columns
                .iter()
                .map(|column| params.add_identifier(column, scope.generator))
                .collect::<Vec<_>>();
            sql.push_str(&format!(" USING ({})", columns.join(", ")));
        }
        Some(Using::Pairs(pairs)) => {
            let child = query.alias.as_deref().unwrap_or(&query.table);
            let parent_scope = scope.target(parent, Some(parent), None);
            let child_scope = parent_scope.target(&query.table, Some(child), None);
            let mut on = Vec::with_capacity(pairs.len());
            for (column, other) in pairs {
                on.push(on_pair(column, other, &parent_scope, &child_scope, params)?);
            }
            sql.push_str(&format!(" ON {}", on.join(" AND ")));
        }
        None => {}
    }
    Ok(sql)
}

fn on_pair(
    column: &str,
    other: &Expr,
    parent: &Scope<'_>,
    child: &Scope<'_>,
    params: &mut ParamContext,
) -> CompileResult<String> {
    match other {
        Expr::Text(token) => {
            let left = resolver::column_token(column, parent, params)?;
            let right = resolver::column_token(token, child, params)?;
            Ok(format!("{} = {}", left, right))
        }
        // comparisons of the parent column against values or known aliases
        Expr::Condition(cond) => {
            let mut scope = child.clone();
            scope.alias = parent.alias;
            conditions::grouped(cond, Parent::Column(column), Junction::And, &scope, params)
        }
        value => {
            let left = resolver::column_token(column, parent, params)?;
            let right = resolver::value(value, child, params)?;
            Ok(format!("{} = {}", left, right))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transpiler::Dialect;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn select(dialect: Dialect, input: serde_json::Value) -> (String, serde_json::Value) {
        let query = Parser::new().select(&input).unwrap();
        let scope = Scope::new(dialect, None);
        let mut params = ParamContext::new();
        let sql = build_select(&query, &scope, &mut params).unwrap();
        (sql, serde_json::to_value(&params.params).unwrap())
    }

    #[test]
    fn test_using_columns() {
        let (sql, values) = select(
            Dialect::MySql,
            json!({"table": "users", "alias": "u", "join": [{"table": "orders", "alias": "o", "type": "left", "using": ["userId"]}]}),
        );
        assert_eq!(sql, "SELECT * FROM ?? AS ?? LEFT JOIN ?? AS ?? USING (??)");
        assert_eq!(values, json!(["users", "u", "orders", "o", "userId"]));
    }

    #[test]
    fn test_on_pairs() {
        let (sql, _) = select(
            Dialect::Postgres,
            json!({"table": "users", "alias": "u", "join": [{"table": "orders", "using": {"id": "userId"}}]}),
        );
        assert_eq!(
            sql,
            "SELECT * FROM \"users\" AS \"u\" JOIN \"orders\" ON \"u\".\"id\" = \"orders\".\"userId\""
        );
    }

    #[test]
    fn test_on_pair_with_condition() {
        let (sql, values) = select(
            Dialect::Sqlite,
            json!({"table": "users", "alias": "u", "join": [{
                "table": "orders", "alias": "o",
                "using": {"id": {"eq": "o.userId"}, "status": {"in": ["a", "b"]}}
            }]}),
        );
        assert_eq!(
            sql,
            "SELECT * FROM \"users\" AS \"u\" JOIN \"orders\" AS \"o\" ON \"u\".\"id\" = \"o\".\"userId\" AND \"u\".\"status\" IN (?, ?)"
        );
        assert_eq!(values, json!(["a", "b"]));
    }

    #[test]
    fn test_derived_join() {
        let (sql, values) = select(
            Dialect::Postgres,
            json!({"table": "users", "alias": "u", "join": [{
                "table": "orders", "alias": "o", "using": ["userId"],
                "select": ["userId", {"sum": {"value": "total", "as": "spent"}}],
                "groupBy": ["userId"]
            }]}),
        );
        assert_eq!(
            sql,
            "SELECT * FROM \"users\" AS \"u\" JOIN (SELECT \"o\".\"userId\", SUM(\"o\".\"total\") AS \"spent\" FROM \"orders\" AS \"o\" GROUP BY \"o\".\"userId\") AS \"o\" USING (\"userId\")"
        );
        assert_eq!(values, json!([]));
    }

    #[test]
    fn test_cross_join_without_using() {
        let (sql, _) = select(
            Dialect::Sqlite,
            json!({"table": "a", "join": [{"table": "b", "type": "cross"}]}),
        );
        assert_eq!(sql, "SELECT * FROM \"a\" CROSS JOIN \"b\"");
    }

    #[test]
    fn test_non_cross_join_requires_using() {
        let err = Parser::new()
            .select(&json!({"table": "a", "join": [{"table": "b"}]}))
            .unwrap_err();
        assert_eq!(err, CompileError::missing("using", "join 'b'"));
    }

    #[test]
    fn test_refer_subquery() {
        let (sql, values) = select(
            Dialect::MySql,
            json!({"table": "users", "alias": "u", "select": ["id", {"refer": {
                "table": "orders", "alias": "o",
                "select": [{"count": {"value": "*"}}],
                "where": {"userId": "u.id"},
                "as": "orderCount"
            }}]}),
        );
        assert_eq!(
            sql,
            "SELECT ??, (SELECT COUNT(*) FROM ?? AS ?? WHERE ?? = ??) AS ? FROM ?? AS ??"
        );
        assert_eq!(
            values,
            json!(["u.id", "orders", "o", "o.userId", "u.id", "orderCount", "users", "u"])
        );
    }
}
