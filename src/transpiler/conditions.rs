//! Condition/predicate compilation.

use super::{ParamContext, Parent, Scope, joins, resolver, wrappers};
use crate::ast::*;
use crate::error::{CompileError, CompileResult};

/// Compile a condition map, siblings joined by `junction`, without outer parentheses.
pub fn condition(
    cond: &Condition,
    parent: Parent<'_>,
    junction: Junction,
    scope: &Scope<'_>,
    params: &mut ParamContext,
) -> CompileResult<String> {
    let mut parts = Vec::with_capacity(cond.len());
    for entry in &cond.entries {
        parts.push(compile_entry(entry, parent, junction, scope, params)?);
    }
    Ok(parts.join(&format!(" {} ", junction.keyword())))
}

/// Like [`condition`], parenthesized when more than one entry is present.
pub fn grouped(
    cond: &Condition,
    parent: Parent<'_>,
    junction: Junction,
    scope: &Scope<'_>,
    params: &mut ParamContext,
) -> CompileResult<String> {
    if cond.is_empty() {
        return Err(CompileError::invalid("condition", "empty condition object"));
    }
    let sql = condition(cond, parent, junction, scope, params)?;
    Ok(if cond.len() > 1 {
        format!("({})", sql)
    } else {
        sql
    })
}

fn emit_parent(parent: Parent<'_>, key: &str, scope: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    match parent {
        Parent::Column(column) => resolver::column_token(column, scope, params),
        Parent::Emit(emit) => emit(params),
        Parent::None => Err(CompileError::missing("column", format!("'{}' comparison", key))),
    }
}

fn compile_entry(
    entry: &Entry,
    parent: Parent<'_>,
    junction: Junction,
    scope: &Scope<'_>,
    params: &mut ParamContext,
) -> CompileResult<String> {
    match entry {
        Entry::Column(key, value) => column_entry(key, value, junction, scope, params),
        Entry::Compare(comparator, value) => compare(*comparator, value, parent, junction, scope, params),
        Entry::Wrapper(wrapper) => wrapper_entry(wrapper, parent, junction, scope, params),
    }
}

fn column_entry(
    key: &str,
    value: &Expr,
    junction: Junction,
    scope: &Scope<'_>,
    params: &mut ParamContext,
) -> CompileResult<String> {
    let parent = Parent::Column(key);
    match value {
        Expr::Condition(nested) => grouped(nested, parent, junction, scope, params),
        Expr::List(items) => in_list(key, Comparator::In, items, parent, scope, params),
        null if resolver::is_null(null) => Ok(format!("{} IS NULL", emit_parent(parent, key, scope, params)?)),
        Expr::Text(token) if token == "isNull" => {
            Ok(format!("{} IS NULL", emit_parent(parent, key, scope, params)?))
        }
        Expr::Text(token) if token == "isNotNull" => {
            Ok(format!("{} IS NOT NULL", emit_parent(parent, key, scope, params)?))
        }
        other => {
            let column = emit_parent(parent, key, scope, params)?;
            let value = resolver::value(other, scope, params)?;
            Ok(format!("{} = {}", column, value))
        }
    }
}

fn in_list(
    key: &str,
    comparator: Comparator,
    items: &[Expr],
    parent: Parent<'_>,
    scope: &Scope<'_>,
    params: &mut ParamContext,
) -> CompileResult<String> {
    if items.is_empty() {
        return Err(CompileError::invalid(key, "IN list must not be empty"));
    }
    let column = emit_parent(parent, key, scope, params)?;
    let mut values = Vec::with_capacity(items.len());
    for item in items {
        values.push(resolver::value(item, scope, params)?);
    }
    Ok(format!("{} {} ({})", column, comparator.operator(), values.join(", ")))
}

fn compare(
    comparator: Comparator,
    value: &Expr,
    parent: Parent<'_>,
    junction: Junction,
    scope: &Scope<'_>,
    params: &mut ParamContext,
) -> CompileResult<String> {
    let key = comparator.operator();
    match (comparator, value) {
        (Comparator::Exists | Comparator::NotExists, Expr::Wrapper(wrapper)) => match wrapper.as_ref() {
            Wrapper::Refer(refer) => Ok(format!(
                "{} {}",
                comparator.operator(),
                joins::subquery(&refer.query, scope, params)?
            )),
            _ => Err(CompileError::invalid(key, "expected a subquery")),
        },
        (Comparator::Exists | Comparator::NotExists, _) => {
            Err(CompileError::invalid(key, "expected a subquery"))
        }
        (Comparator::Eq, null) if resolver::is_null(null) => {
            Ok(format!("{} IS NULL", emit_parent(parent, key, scope, params)?))
        }
        (Comparator::NotEq, null) if resolver::is_null(null) => {
            Ok(format!("{} IS NOT NULL", emit_parent(parent, key, scope, params)?))
        }
        (Comparator::Eq | Comparator::In, Expr::List(items)) => {
            in_list(key, Comparator::In, items, parent, scope, params)
        }
        (Comparator::NotEq | Comparator::NotIn, Expr::List(items)) => {
            in_list(key, Comparator::NotIn, items, parent, scope, params)
        }
        (Comparator::In | Comparator::NotIn, single) => {
            in_list(key, comparator, std::slice::from_ref(single), parent, scope, params)
        }
        (_, Expr::Condition(nested)) if comparator.wildcards().is_none() => {
            // right-hand side is itself a boolean expression
            let column = emit_parent(parent, key, scope, params)?;
            let rhs = grouped(nested, Parent::None, junction, scope, params)?;
            Ok(format!("{} {} {}", column, comparator.operator(), rhs))
        }
        _ => {
            let column = emit_parent(parent, key, scope, params)?;
            let rhs = resolver::value(value, scope, params)?;
            let rhs = match comparator.wildcards() {
                Some((leading, trailing)) => like_pattern(&rhs, leading, trailing, scope),
                None => rhs,
            };
            Ok(format!("{} {} {}", column, comparator.operator(), rhs))
        }
    }
}

/// Concatenate `%` around an already emitted value.
fn like_pattern(rhs: &str, leading: bool, trailing: bool, scope: &Scope<'_>) -> String {
    let generator = scope.generator;
    let value = generator.text_param(rhs);
    let mut parts = Vec::with_capacity(3);
    if leading {
        parts.push("'%'");
    }
    parts.push(value.as_str());
    if trailing {
        parts.push("'%'");
    }
    generator.string_concat(&parts)
}

fn wrapper_entry(
    wrapper: &Wrapper,
    parent: Parent<'_>,
    junction: Junction,
    scope: &Scope<'_>,
    params: &mut ParamContext,
) -> CompileResult<String> {
    match wrapper {
        Wrapper::And(list) => connective(list, Junction::And, parent, junction, scope, params),
        Wrapper::Or(list) => connective(list, Junction::Or, parent, junction, scope, params),
        Wrapper::Between(between) => {
            let column = emit_parent(parent, "between", scope, params)?;
            let low = resolver::value(&between.gt, scope, params)?;
            let high = resolver::value(&between.lt, scope, params)?;
            Ok(format!("{} BETWEEN {} AND {}", column, low, high))
        }
        value_wrapper => {
            let sql = wrappers::compile(value_wrapper, scope, params, wrappers::Position::Condition)?;
            match parent {
                // a bare value wrapper under a column compares for equality
                Parent::Column(_) | Parent::Emit(_) if !wrappers::has_compare(value_wrapper) => {
                    let column = emit_parent(parent, value_wrapper.key(), scope, params)?;
                    Ok(format!("{} = {}", column, sql))
                }
                _ => Ok(sql),
            }
        }
    }
}

/// `and`/`or` lists: each map compiled on its own, joined by `connective`.
fn connective(
    list: &[Condition],
    connective: Junction,
    parent: Parent<'_>,
    junction: Junction,
    scope: &Scope<'_>,
    params: &mut ParamContext,
) -> CompileResult<String> {
    let mut parts = Vec::with_capacity(list.len());
    for cond in list {
        parts.push(grouped(cond, parent, junction, scope, params)?);
    }
    let sql = parts.join(&format!(" {} ", connective.keyword()));
    Ok(if parts.len() > 1 {
        format!("({})", sql)
    } else {
        sql
    })
}
