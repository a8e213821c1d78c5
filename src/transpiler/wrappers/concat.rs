use super::{cast_to, string::apply_chain};
use crate::ast::*;
use crate::error::CompileResult;
use crate::transpiler::{Dialect, ParamContext, Scope, resolver};

pub fn compile(op: &ConcatOp, scope: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    let scope = scope.with_call(op.encryption.as_ref());
    let generator = scope.generator;

    let mut expr = match (&op.separator, scope.dialect) {
        // no CONCAT_WS: the separator is bound once per gap
        (Some(separator), Dialect::Sqlite) => {
            let mut parts = Vec::with_capacity(op.values.len() * 2);
            for (i, value) in op.values.iter().enumerate() {
                if i > 0 {
                    parts.push(params.add_param(Value::String(separator.clone()), generator));
                }
                parts.push(resolver::column(value, &scope, params)?);
            }
            format!("({})", parts.join(" || "))
        }
        (Some(separator), _) => {
            let separator = params.add_param(Value::String(separator.clone()), generator);
            let mut parts = vec![generator.text_param(&separator)];
            parts.extend(super::arguments(&op.values, &scope, params)?);
            format!("CONCAT_WS({})", parts.join(", "))
        }
        (None, Dialect::Sqlite) => {
            let parts = super::arguments(&op.values, &scope, params)?;
            format!("({})", parts.join(" || "))
        }
        (None, _) => {
            let parts = super::arguments(&op.values, &scope, params)?;
            format!("CONCAT({})", parts.join(", "))
        }
    };

    if let Some(cast) = op.cast {
        expr = cast_to(&expr, cast, &scope)?;
    }
    apply_chain(expr, &op.chain, &scope, params)
}
