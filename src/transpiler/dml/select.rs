//! SELECT SQL generation.

use crate::ast::*;
use crate::error::CompileResult;
use crate::transpiler::wrappers::{self, Position};
use crate::transpiler::{ParamContext, Parent, Scope, conditions, joins, resolver};

/// Generate SELECT SQL for `query` within `outer`.
pub fn build_select(query: &SelectQuery, outer: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    build_select_with(query, outer, params, |scope: &Scope<'_>, params: &mut ParamContext| {
        select_list(&query.select, scope, params)
    })
}

/// Generate SELECT SQL with a caller-built select list, compiled in the query's own scope.
pub fn build_select_with<F>(
    query: &SelectQuery,
    outer: &Scope<'_>,
    params: &mut ParamContext,
    items: F,
) -> CompileResult<String>
where
    F: FnOnce(&Scope<'_>, &mut ParamContext) -> CompileResult<String>,
{
    let scope = outer.enter(query);

    let mut sql = String::from("SELECT ");
    sql.push_str(&items(&scope, params)?);

    // FROM
    sql.push_str(" FROM ");
    sql.push_str(&joins::table_ref(&query.table, query.alias.as_deref(), &scope, params));

    // JOINS
    let qualifier = query.alias.as_deref().unwrap_or(&query.table);
    for join in &query.joins {
        sql.push(' ');
        sql.push_str(&joins::compile_join(join, qualifier, &scope, params)?);
    }

    // WHERE
    if let Some(filter) = query.filter.as_ref().filter(|f| !f.is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions::condition(filter, Parent::None, query.junction, &scope, params)?);
    }

    let outputs = output_aliases(&query.select);

    // GROUP BY
    if !query.group_by.is_empty() {
        let mut columns = Vec::with_capacity(query.group_by.len());
        for item in &query.group_by {
            columns.push(sort_key(item, &outputs, &scope, params)?);
        }
        sql.push_str(" GROUP BY ");
        sql.push_str(&columns.join(", "));
    }

    // HAVING
    if let Some(having) = query.having.as_ref().filter(|h| !h.is_empty()) {
        sql.push_str(" HAVING ");
        sql.push_str(&conditions::condition(having, Parent::None, query.junction, &scope, params)?);
    }

    // ORDER BY
    if !query.order_by.is_empty() {
        let mut items = Vec::with_capacity(query.order_by.len());
        for item in &query.order_by {
            let column = sort_key(&item.column, &outputs, &scope, params)?;
            items.push(format!("{} {}", column, item.order.keyword()));
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(&items.join(", "));
    }

    sql.push_str(&limit_offset(query.limit, query.offset, &scope, params));
    Ok(sql)
}

fn select_list(items: &[Expr], scope: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    if items.is_empty() {
        return Ok("*".to_string());
    }
    let mut columns = Vec::with_capacity(items.len());
    for item in items {
        columns.push(match item {
            Expr::Wrapper(wrapper) => wrappers::compile(wrapper, scope, params, Position::Select)?,
            other => resolver::column(other, scope, params)?,
        });
    }
    Ok(columns.join(", "))
}

/// Aliases given to select items; ORDER BY and GROUP BY may name them unqualified.
fn output_aliases(items: &[Expr]) -> Vec<&str> {
    items
        .iter()
        .filter_map(|item| match item {
            Expr::Wrapper(wrapper) => wrappers::alias_of(wrapper),
            _ => None,
        })
        .collect()
}

fn sort_key(expr: &Expr, outputs: &[&str], scope: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    match expr {
        Expr::Text(token) if outputs.contains(&token.as_str()) => {
            Ok(params.add_identifier(token, scope.generator))
        }
        other => resolver::column(other, scope, params),
    }
}

/// Bound LIMIT/OFFSET; OFFSET alone gets the dialect's "no limit" sentinel where one is required.
fn limit_offset(limit: Option<u64>, offset: Option<u64>, scope: &Scope<'_>, params: &mut ParamContext) -> String {
    let generator = scope.generator;
    let mut sql = String::new();
    match (limit, offset) {
        (Some(n), _) => {
            let p = params.add_param(Value::from(n), generator);
            sql.push_str(&format!(" LIMIT {}", p));
        }
        (None, Some(_)) => {
            if let Some(unbounded) = generator.unbounded_limit() {
                sql.push_str(&format!(" LIMIT {}", unbounded));
            }
        }
        (None, None) => {}
    }
    if let Some(n) = offset {
        let p = params.add_param(Value::from(n), generator);
        sql.push_str(&format!(" OFFSET {}", p));
    }
    sql
}
