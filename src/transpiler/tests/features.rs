//! Subqueries, JSON construction, encryption, permissive omissions and traces.

use pretty_assertions::assert_eq;
use serde_json::json;

use super::values;
use crate::ast::Value;
use crate::config::{Compiler, CompilerConfig};
use crate::error::ErrorKind;
use crate::transpiler::encryption::{EncryptionConfig, EncryptionMode};
use crate::transpiler::{Dialect, Statement, date_pattern};
use crate::{compile_insert_update, compile_select};

#[test]
fn test_bare_join_is_not_derived() {
    let compiled = compile_select(
        &json!({"table": "users", "alias": "u", "join": [{"table": "orders", "using": ["userId"]}]}),
        Dialect::Sqlite,
    )
    .unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT * FROM \"users\" AS \"u\" JOIN \"orders\" USING (\"userId\")"
    );
}

#[test]
fn test_exists_subquery() {
    let compiled = compile_select(
        &json!({
            "table": "users", "alias": "u",
            "where": {"exists": {
                "table": "orders", "alias": "o",
                "select": ["id"],
                "where": {"userId": "u.id"}
            }}
        }),
        Dialect::Postgres,
    )
    .unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT * FROM \"users\" AS \"u\" WHERE EXISTS (SELECT \"o\".\"id\" FROM \"orders\" AS \"o\" WHERE \"o\".\"userId\" = \"u\".\"id\")"
    );
    assert!(compiled.values.is_empty());
}

#[test]
fn test_join_alias_in_where() {
    let compiled = compile_select(
        &json!({
            "table": "users", "alias": "u",
            "join": [{"table": "orders", "alias": "o", "using": {"id": "userId"}}],
            "where": {"createdAt": {"lt": "o.createdAt"}, "note": "o.total"}
        }),
        Dialect::MySql,
    )
    .unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT * FROM ?? AS ?? JOIN ?? AS ?? ON ?? = ?? WHERE ?? < ?? AND ?? = ??"
    );
    assert_eq!(
        values(&compiled),
        json!([
            "users", "u", "orders", "o", "u.id", "o.userId",
            "u.createdAt", "o.createdAt", "u.note", "o.total"
        ])
    );
}

#[test]
fn test_unknown_alias_text_is_a_value() {
    let compiled = compile_select(
        &json!({"table": "users", "alias": "u", "where": {"email": "x.y"}}),
        Dialect::Postgres,
    )
    .unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT * FROM \"users\" AS \"u\" WHERE \"u\".\"email\" = $1"
    );
    assert_eq!(compiled.values, vec![Value::String("x.y".into())]);
}

#[test]
fn test_json_object_per_user() {
    let compiled = compile_select(
        &json!({
            "table": "users", "alias": "u",
            "select": [{"json": {"value": {"id": "id", "mail": "email"}, "as": "profile"}}]
        }),
        Dialect::Postgres,
    )
    .unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT json_build_object(CAST($1 AS TEXT), \"u\".\"id\", CAST($2 AS TEXT), \"u\".\"email\") AS \"profile\" FROM \"users\" AS \"u\""
    );
    assert_eq!(values(&compiled), json!(["id", "mail"]));
}

#[test]
fn test_sqlite_contains_rejected() {
    let err = compile_select(
        &json!({
            "table": "users",
            "select": [{"json": {"value": ["tags"], "contains": ["red"]}}]
        }),
        Dialect::Sqlite,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedByDialect);
}

#[test]
fn test_decrypt_adds_session_preamble() {
    let compiled = compile_select(
        &json!({
            "table": "users",
            "select": [{"str": {"value": "ssn", "decrypt": true, "as": "ssn"}}],
            "encryption": {"secret": "k", "iv": "v"}
        }),
        Dialect::MySql,
    )
    .unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT AES_DECRYPT(??, UNHEX(SHA2(?, 512)), ?) AS ? FROM ??"
    );
    assert_eq!(values(&compiled), json!(["ssn", "k", "v", "ssn", "users"]));
    assert_eq!(
        compiled.preamble,
        vec![Statement {
            sql: "SET SESSION block_encryption_mode = ?".into(),
            values: vec![Value::String("aes-256-cbc".into())],
        }]
    );
}

#[test]
fn test_model_encryption_from_config() {
    let compiler = Compiler::new(CompilerConfig {
        dialect: Dialect::Postgres,
        safe_mode: true,
        encryption: Some(EncryptionConfig {
            mode: Some(EncryptionMode::Aes128Ecb),
            secret: Some("model".into()),
            ..Default::default()
        }),
    });
    let compiled = compiler
        .insert_update(&json!({
            "table": "users", "data": {"ssn": "123"},
            "encrypt": {"ssn": {}}
        }))
        .unwrap();
    assert_eq!(
        compiled.sql,
        "INSERT INTO \"users\" (\"ssn\") VALUES (pgp_sym_encrypt(CAST($1 AS TEXT), $2, 'cipher-algo=aes128'))"
    );
    assert_eq!(values(&compiled), json!(["123", "model"]));
    assert!(compiled.preamble.is_empty());
}

#[test]
fn test_cbc_decrypt_without_iv() {
    let err = compile_select(
        &json!({
            "table": "users",
            "select": [{"str": {"value": "ssn", "decrypt": {"mode": "aes-128-cbc", "secret": "k"}}}]
        }),
        Dialect::MySql,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingParameter);
}

#[test]
fn test_sqlite_encryption_unsupported() {
    let err = compile_insert_update(
        &json!({"table": "t", "data": {"a": "b"}, "encrypt": {"a": {"secret": "k", "mode": "aes-256-ecb"}}}),
        Dialect::Sqlite,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedByDialect);
}

#[test]
fn test_date_pattern_keeps_literals() {
    assert_eq!(date_pattern::translate("YYYY-MM-[T]dd", Dialect::MySql).unwrap(), "%Y-%m-T%d");
    assert_eq!(
        date_pattern::translate("YYYY-MM-[T]dd", Dialect::Postgres).unwrap(),
        "YYYY-MM-\"T\"DD"
    );
}

#[test]
fn test_malformed_group_by_warns() {
    let compiled = compile_select(
        &json!({"table": "users", "groupBy": {"status": true}}),
        Dialect::Sqlite,
    )
    .unwrap();
    assert_eq!(compiled.sql, "SELECT * FROM \"users\"");
    assert_eq!(compiled.warnings.len(), 1);
    assert!(compiled.warnings[0].starts_with("select.groupBy"));
}

#[test]
fn test_debug_trace() {
    let compiled = compile_select(
        &json!({"table": "users", "where": {"id": 1}, "orderBy": "id"}),
        Dialect::MySql,
    )
    .unwrap();
    assert_eq!(
        serde_json::to_value(compiled.trace()).unwrap(),
        json!({
            "dialect": "mysql",
            "sql": "SELECT * FROM ?? WHERE ?? = ?",
            "values": ["users", "id", 1],
            "warnings": ["select.orderBy: expected an object of column: asc|desc, fragment omitted"]
        })
    );
}

#[test]
fn test_if_outside_mysql() {
    let err = compile_select(
        &json!({
            "table": "users",
            "select": [{"if": {"check": {"vip": true}, "trueValue": 1, "falseValue": 0}}]
        }),
        Dialect::Sqlite,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedByDialect);
}
