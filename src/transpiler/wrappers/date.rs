use super::operand;
use crate::ast::*;
use crate::error::{CompileError, CompileResult};
use crate::transpiler::{Dialect, ParamContext, Scope, date_pattern};

/// fromPattern → add → sub → format.
pub fn compile(op: &DateOp, scope: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    let generator = scope.generator;
    // sqlite STRFTIME takes its format before the operand
    let mark = params.mark();
    let mut expr = operand(&op.operand, scope, params)?;

    if let Some(pattern) = &op.from_pattern {
        let native = date_pattern::translate(pattern, scope.dialect)?;
        expr = match scope.dialect {
            Dialect::MySql => {
                let p = params.add_param(Value::String(native), generator);
                format!("STR_TO_DATE({}, {})", expr, p)
            }
            Dialect::Postgres => {
                let p = params.add_param(Value::String(native), generator);
                format!("TO_TIMESTAMP({}, {})", expr, p)
            }
            Dialect::Sqlite => return Err(CompileError::unsupported("fromPattern", scope.dialect)),
        };
    }

    for step in &op.add {
        expr = shift(expr, *step, false, scope, params)?;
    }
    for step in &op.sub {
        expr = shift(expr, *step, true, scope, params)?;
    }

    if let Some(pattern) = &op.format {
        let native = date_pattern::translate(pattern, scope.dialect)?;
        expr = match scope.dialect {
            Dialect::MySql => {
                let p = params.add_param(Value::String(native), generator);
                format!("DATE_FORMAT({}, {})", expr, p)
            }
            Dialect::Postgres => {
                let p = params.add_param(Value::String(native), generator);
                format!("TO_CHAR({}, {})", expr, p)
            }
            Dialect::Sqlite => {
                let p = params.insert_param(mark, Value::String(native), generator);
                format!("STRFTIME({}, {})", p, expr)
            }
        };
    }

    Ok(expr)
}

fn shift(
    expr: String,
    step: IntervalStep,
    subtract: bool,
    scope: &Scope<'_>,
    params: &mut ParamContext,
) -> CompileResult<String> {
    let generator = scope.generator;
    Ok(match scope.dialect {
        Dialect::MySql => {
            let amount = params.add_param(Value::Int(step.amount), generator);
            let function = if subtract { "DATE_SUB" } else { "DATE_ADD" };
            format!("{}({}, INTERVAL {} {})", function, expr, amount, step.unit)
        }
        Dialect::Postgres => {
            let amount = params.add_param(Value::Int(step.amount), generator);
            let operator = if subtract { "-" } else { "+" };
            format!(
                "({} {} CAST({} AS INTEGER) * INTERVAL '{}')",
                expr,
                operator,
                amount,
                pg_interval(step.unit)
            )
        }
        Dialect::Sqlite => {
            let field = if subtract { "date.sub" } else { "date.add" };
            let amount = if subtract { step.amount.checked_neg() } else { Some(step.amount) };
            let modifier = amount
                .and_then(|amount| sqlite_modifier(amount, step.unit))
                .ok_or_else(|| CompileError::invalid(field, format!("interval amount {} out of range", step.amount)))?;
            let modifier = params.add_param(Value::String(modifier), generator);
            format!("DATETIME({}, {})", expr, modifier)
        }
    })
}

fn pg_interval(unit: IntervalUnit) -> &'static str {
    match unit {
        IntervalUnit::Microsecond => "1 microsecond",
        IntervalUnit::Second => "1 second",
        IntervalUnit::Minute => "1 minute",
        IntervalUnit::Hour => "1 hour",
        IntervalUnit::Day => "1 day",
        IntervalUnit::Week => "1 week",
        IntervalUnit::Month => "1 month",
        IntervalUnit::Quarter => "3 months",
        IntervalUnit::Year => "1 year",
    }
}

/// `DATETIME` modifier such as `+3 days`; sqlite only knows seconds through years.
fn sqlite_modifier(amount: i64, unit: IntervalUnit) -> Option<String> {
    Some(match unit {
        IntervalUnit::Microsecond => format!("{:+.6} seconds", amount as f64 / 1_000_000.0),
        IntervalUnit::Second => format!("{:+} seconds", amount),
        IntervalUnit::Minute => format!("{:+} minutes", amount),
        IntervalUnit::Hour => format!("{:+} hours", amount),
        IntervalUnit::Day => format!("{:+} days", amount),
        IntervalUnit::Week => format!("{:+} days", amount.checked_mul(7)?),
        IntervalUnit::Month => format!("{:+} months", amount),
        IntervalUnit::Quarter => format!("{:+} months", amount.checked_mul(3)?),
        IntervalUnit::Year => format!("{:+} years", amount),
    })
}
