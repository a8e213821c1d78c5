use super::operand;
use crate::ast::*;
use crate::error::CompileResult;
use crate::transpiler::{Dialect, ParamContext, Scope, resolver};

/// Arithmetic steps are parenthesized so the listed order is the applied order.
pub fn compile(op: &NumericOp, scope: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    let mut expr = operand(&op.operand, scope, params)?;

    if let Some(exponent) = &op.power {
        let exponent = resolver::column(exponent, scope, params)?;
        expr = format!("POWER({}, {})", expr, exponent);
    }

    let steps = [
        ("/", &op.divide_by),
        ("%", &op.modulus),
        ("*", &op.multiply_by),
        ("+", &op.add),
        ("-", &op.subtract),
    ];
    for (operator, step) in steps {
        if let Some(step) = step {
            let rhs = resolver::column(step, scope, params)?;
            expr = format!("({} {} {})", expr, operator, rhs);
        }
    }

    if let Some(decimal) = op.decimal {
        expr = match decimal {
            DecimalMode::Ceil => format!("CEIL({})", expr),
            DecimalMode::Floor => format!("FLOOR({})", expr),
            DecimalMode::Round => format!("ROUND({})", expr),
            DecimalMode::Digits(digits) => {
                let digits = params.add_param(Value::Int(i64::from(digits)), scope.generator);
                match scope.dialect {
                    // two-argument ROUND only exists for numeric
                    Dialect::Postgres => format!("ROUND(CAST({} AS NUMERIC), {})", expr, digits),
                    _ => format!("ROUND({}, {})", expr, digits),
                }
            }
        };
    }

    Ok(expr)
}
