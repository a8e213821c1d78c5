//! INSERT, UPDATE and upsert SQL generation.
//!
//! Data strings are always bound values; only wrapper objects compile to expressions.

use crate::ast::*;
use crate::error::{CompileError, CompileResult};
use crate::transpiler::encryption::{self, EncryptionConfig};
use crate::transpiler::wrappers::{self, Position};
use crate::transpiler::{Dialect, ParamContext, Parent, Scope, conditions, joins, resolver};

/// Generate INSERT (single or bulk) or, when `where` is present, UPDATE SQL.
pub fn build_insert_update(query: &WriteQuery, outer: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    if query.filter.is_some() {
        build_update(query, outer, params)
    } else {
        build_insert(query, outer, params)
    }
}

fn build_update(query: &WriteQuery, outer: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    let [row] = query.rows.as_slice() else {
        return Err(CompileError::invalid("save.data", "an UPDATE takes a single object"));
    };
    if !query.upsert.is_empty() {
        return Err(CompileError::invalid("save.upsert", "cannot be combined with where"));
    }
    let scope = outer.target(&query.table, query.alias.as_deref(), query.encryption.as_ref());

    let mut sql = String::from("UPDATE ");
    sql.push_str(&joins::table_ref(&query.table, query.alias.as_deref(), &scope, params));
    sql.push_str(" SET ");
    sql.push_str(&assignments(row, query, &scope, params)?);

    if let Some(filter) = query.filter.as_ref().filter(|f| !f.is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions::condition(filter, Parent::None, query.junction, &scope, params)?);
    }
    Ok(sql)
}

fn build_insert(query: &WriteQuery, outer: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    let Some(first) = query.rows.first() else {
        return Err(CompileError::missing("data", "save"));
    };
    // INSERT targets carry no alias, so bare columns stay unqualified.
    let scope = outer.target(&query.table, None, query.encryption.as_ref());
    let generator = scope.generator;

    let mut sql = String::from("INSERT INTO ");
    sql.push_str(&params.add_identifier(&query.table, generator));

    let columns: Vec<String> = first
        .iter()
        .map(|(column, _)| params.add_identifier(column, generator))
        .collect();
    sql.push_str(&format!(" ({}) VALUES ", columns.join(", ")));

    let mut tuples = Vec::with_capacity(query.rows.len());
    for (position, row) in query.rows.iter().enumerate() {
        if row.len() != first.len() {
            return Err(mismatched_row(position));
        }
        let mut values = Vec::with_capacity(first.len());
        for (column, _) in first {
            let value = row
                .iter()
                .find(|(other, _)| other == column)
                .map(|(_, value)| value)
                .ok_or_else(|| mismatched_row(position))?;
            values.push(column_value(column, value, query, &scope, params)?);
        }
        tuples.push(format!("({})", values.join(", ")));
    }
    sql.push_str(&tuples.join(", "));

    if !query.upsert.is_empty() {
        sql.push_str(&upsert_clause(query, &scope, params)?);
    }
    Ok(sql)
}

fn mismatched_row(position: usize) -> CompileError {
    CompileError::invalid(
        format!("save.data[{}]", position),
        "every row must have the same columns as the first row",
    )
}

/// `ON DUPLICATE KEY UPDATE` on mysql, `ON CONFLICT (...) DO UPDATE SET` elsewhere.
fn upsert_clause(query: &WriteQuery, scope: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    let generator = scope.generator;
    let mut sql = match scope.dialect {
        Dialect::MySql => String::from(" ON DUPLICATE KEY UPDATE "),
        Dialect::Postgres | Dialect::Sqlite => {
            if query.indexes.is_empty() {
                return Err(CompileError::missing("indexes", "save.upsert"));
            }
            let indexes: Vec<String> = query
                .indexes
                .iter()
                .map(|index| params.add_identifier(index, generator))
                .collect();
            format!(" ON CONFLICT ({}) DO UPDATE SET ", indexes.join(", "))
        }
    };
    sql.push_str(&assignments(&query.upsert, query, scope, params)?);
    Ok(sql)
}

/// `column = value` pairs with unqualified columns.
fn assignments(
    pairs: &[(String, Expr)],
    query: &WriteQuery,
    scope: &Scope<'_>,
    params: &mut ParamContext,
) -> CompileResult<String> {
    let mut set = Vec::with_capacity(pairs.len());
    for (column, value) in pairs {
        let target = params.add_identifier(column, scope.generator);
        let value = column_value(column, value, query, scope, params)?;
        set.push(format!("{} = {}", target, value));
    }
    Ok(set.join(", "))
}

fn column_value(
    column: &str,
    value: &Expr,
    query: &WriteQuery,
    scope: &Scope<'_>,
    params: &mut ParamContext,
) -> CompileResult<String> {
    let sql = match value {
        Expr::Text(text) => params.add_param(Value::String(text.clone()), scope.generator),
        Expr::Wrapper(wrapper) => wrappers::compile(wrapper, scope, params, Position::Inline)?,
        Expr::Null | Expr::Bool(_) | Expr::Number(_) => resolver::value(value, scope, params)?,
        Expr::List(_) | Expr::Condition(_) => {
            return Err(CompileError::invalid(
                format!("save.data.{}", column),
                "expected a scalar or a wrapper object",
            ));
        }
    };
    match column_encryption(column, query) {
        Some(config) => {
            let resolved = encryption::resolve_in_scope(Some(config), scope)?;
            encryption::encrypt(&sql, &resolved, scope, params)
        }
        None => Ok(sql),
    }
}

fn column_encryption<'q>(column: &str, query: &'q WriteQuery) -> Option<&'q EncryptionConfig> {
    query
        .encrypt
        .iter()
        .find(|(name, _)| name == column)
        .map(|(_, config)| config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn write(dialect: Dialect, input: serde_json::Value) -> CompileResult<(String, serde_json::Value)> {
        let query = Parser::new().write(&input)?;
        let mut params = ParamContext::new();
        let sql = build_insert_update(&query, &Scope::new(dialect, None), &mut params)?;
        Ok((sql, serde_json::to_value(&params.params).unwrap()))
    }

    #[test]
    fn test_single_insert() {
        let input = json!({"table": "users", "data": {"name": "Ann", "age": 30}});
        let (sql, values) = write(Dialect::MySql, input.clone()).unwrap();
        assert_eq!(sql, "INSERT INTO ?? (??, ??) VALUES (?, ?)");
        assert_eq!(values, json!(["users", "name", "age", "Ann", 30]));

        let (sql, values) = write(Dialect::Postgres, input).unwrap();
        assert_eq!(sql, "INSERT INTO \"users\" (\"name\", \"age\") VALUES ($1, $2)");
        assert_eq!(values, json!(["Ann", 30]));
    }

    #[test]
    fn test_bulk_insert_follows_first_row_order() {
        let (sql, values) = write(
            Dialect::Sqlite,
            json!({"table": "t", "data": [{"a": 1, "b": "x"}, {"b": "y", "a": 2}]}),
        )
        .unwrap();
        assert_eq!(sql, "INSERT INTO \"t\" (\"a\", \"b\") VALUES (?, ?), (?, ?)");
        assert_eq!(values, json!([1, "x", 2, "y"]));
    }

    #[test]
    fn test_bulk_insert_rejects_mismatched_rows() {
        let err = write(
            Dialect::Sqlite,
            json!({"table": "t", "data": [{"a": 1}, {"b": 2}]}),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_update_with_where() {
        let (sql, values) = write(
            Dialect::Postgres,
            json!({"table": "users", "data": {"status": "now"}, "where": {"id": 7}}),
        )
        .unwrap();
        assert_eq!(sql, "UPDATE \"users\" SET \"status\" = $1 WHERE \"id\" = $2");
        // data strings are never constants
        assert_eq!(values, json!(["now", 7]));
    }

    #[test]
    fn test_upsert_per_dialect() {
        let input = json!({
            "table": "stock", "data": {"sku": "A1", "qty": 5},
            "upsert": {"qty": 5}, "indexes": ["sku"]
        });
        let (sql, values) = write(Dialect::MySql, input.clone()).unwrap();
        assert_eq!(sql, "INSERT INTO ?? (??, ??) VALUES (?, ?) ON DUPLICATE KEY UPDATE ?? = ?");
        assert_eq!(values, json!(["stock", "sku", "qty", "A1", 5, "qty", 5]));

        let (sql, _) = write(Dialect::Postgres, input).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO \"stock\" (\"sku\", \"qty\") VALUES ($1, $2) ON CONFLICT (\"sku\") DO UPDATE SET \"qty\" = $3"
        );

        let err = write(
            Dialect::Sqlite,
            json!({"table": "stock", "data": {"sku": "A1"}, "upsert": {"sku": "A1"}}),
        )
        .unwrap_err();
        assert_eq!(err, CompileError::missing("indexes", "save.upsert"));
    }

    #[test]
    fn test_encrypted_column() {
        let (sql, values) = write(
            Dialect::MySql,
            json!({
                "table": "users", "data": {"ssn": "123"},
                "encrypt": {"ssn": {"secret": "k", "iv": "v"}}
            }),
        )
        .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO ?? (??) VALUES (AES_ENCRYPT(?, UNHEX(SHA2(?, 512)), ?))"
        );
        assert_eq!(values, json!(["users", "ssn", "123", "k", "v"]));
    }

    #[test]
    fn test_wrapper_value_compiles() {
        let (sql, values) = write(
            Dialect::Postgres,
            json!({"table": "users", "data": {"slug": {"str": {"value": "#Ann", "textCase": "lower"}}}}),
        )
        .unwrap();
        assert_eq!(sql, "INSERT INTO \"users\" (\"slug\") VALUES (LOWER($1))");
        assert_eq!(values, json!(["Ann"]));
    }
}
