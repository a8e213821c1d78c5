//! `json` and `array` construction.

use super::dml::select::build_select_with;
use super::{ParamContext, Scope, resolver};
use crate::ast::*;
use crate::error::{CompileError, CompileResult};

/// Constructor, optionally over a derived source, then `extract` and `contains`.
pub fn compile(op: &JsonOp, scope: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    let mut expr = match &op.source {
        Some(source) => {
            let body = build_select_with(source, scope, params, |inner: &Scope<'_>, params: &mut ParamContext| {
                build(op, inner, params)
            })?;
            format!("({})", body)
        }
        None => build(op, scope, params)?,
    };

    let generator = scope.generator;
    if let Some(path) = &op.extract {
        let path = params.add_param(Value::String(generator.json_path(path)), generator);
        expr = generator.json_extract(&expr, &path);
    }
    if let Some(candidate) = &op.contains {
        let placeholder = params.add_param(Value::String(candidate.to_string()), generator);
        expr = generator
            .json_contains(&expr, &placeholder)
            .ok_or_else(|| CompileError::unsupported("contains", scope.dialect))?;
    }
    Ok(expr)
}

/// The constructor call, aggregated when requested.
fn build(op: &JsonOp, scope: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    let generator = scope.generator;
    let inner = match &op.value {
        JsonBody::Object(pairs) => {
            let mut args = Vec::with_capacity(pairs.len() * 2);
            for (key, value) in pairs {
                let key = params.add_param(Value::String(key.clone()), generator);
                args.push(generator.json_key(&key));
                args.push(resolver::column(value, scope, params)?);
            }
            format!("{}({})", generator.json_object_function(), args.join(", "))
        }
        JsonBody::Array(items) => {
            let args = super::wrappers::arguments(items, scope, params)?;
            format!("{}({})", generator.json_array_function(), args.join(", "))
        }
        JsonBody::Single(value) if op.aggregate => resolver::column(value, scope, params)?,
        JsonBody::Single(value) => {
            let arg = resolver::column(value, scope, params)?;
            format!("{}({})", generator.json_array_function(), arg)
        }
    };
    Ok(if op.aggregate {
        format!("{}({})", generator.json_agg_function(), inner)
    } else {
        inner
    })
}
