//! `if` and `case` expressions.

use crate::ast::*;
use crate::error::{CompileError, CompileResult};
use crate::transpiler::{Dialect, ParamContext, Parent, Scope, conditions, resolver};

/// mysql `IF(check, then, else)`.
pub fn compile_if(op: &IfOp, scope: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    if scope.dialect != Dialect::MySql {
        return Err(CompileError::unsupported("if", scope.dialect));
    }
    let check = conditions::condition(&op.check, Parent::None, Junction::And, scope, params)?;
    let then = resolver::value(&op.true_value, scope, params)?;
    let otherwise = resolver::value(&op.false_value, scope, params)?;
    Ok(format!("IF({}, {}, {})", check, then, otherwise))
}

pub fn compile_case(op: &CaseOp, scope: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    let mut sql = String::from("CASE");
    for branch in &op.branches {
        let when = conditions::condition(&branch.when, Parent::None, Junction::And, scope, params)?;
        let then = resolver::value(&branch.then, scope, params)?;
        sql.push_str(&format!(" WHEN {} THEN {}", when, then));
    }
    if let Some(otherwise) = &op.otherwise {
        sql.push_str(&format!(" ELSE {}", resolver::value(otherwise, scope, params)?));
    }
    sql.push_str(" END");
    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::super::tests::{select_error, select_item};
    use crate::error::ErrorKind;
    use crate::transpiler::Dialect;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_if_mysql_only() {
        let input = json!({"if": {"check": {"age": {"gtEq": 18}}, "trueValue": "adult", "falseValue": "minor", "as": "band"}});
        let (sql, values) = select_item(Dialect::MySql, input.clone());
        assert_eq!(sql, "IF(?? >= ?, ?, ?) AS ?");
        assert_eq!(values, json!(["u.age", 18, "adult", "minor", "band"]));

        let err = select_error(Dialect::Postgres, input);
        assert_eq!(err.kind(), ErrorKind::UnsupportedByDialect);
    }

    #[test]
    fn test_case_portable() {
        let input = json!({"case": {
            "check": [
                {"when": {"score": {"gt": 90}}, "then": "A"},
                {"when": {"score": {"gt": 75}}, "then": "B"}
            ],
            "else": "C",
            "as": "grade"
        }});
        let (sql, values) = select_item(Dialect::Postgres, input);
        assert_eq!(
            sql,
            "CASE WHEN \"u\".\"score\" > $1 THEN $2 WHEN \"u\".\"score\" > $3 THEN $4 ELSE $5 END AS \"grade\""
        );
        assert_eq!(values, json!([90, "A", 75, "B", "C"]));
    }

    #[test]
    fn test_case_branch_may_reference_column() {
        let input = json!({"case": {"check": [{"when": {"vip": true}, "then": "users.discount"}], "else": 0}});
        let mut parser = crate::ast::Parser::new();
        let crate::ast::Expr::Wrapper(wrapper) = parser.expr(&input).unwrap() else {
            panic!("not a wrapper");
        };
        let mut scope = crate::transpiler::Scope::new(Dialect::Sqlite, None);
        scope.known_aliases = vec!["users"];
        let mut params = crate::transpiler::ParamContext::new();
        let sql = super::super::compile(&wrapper, &scope, &mut params, super::super::Position::Inline).unwrap();
        assert_eq!(sql, "CASE WHEN \"vip\" = ? THEN \"users\".\"discount\" ELSE ? END");
    }
}
