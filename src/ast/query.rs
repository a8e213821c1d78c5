//! Statement-level descriptions.

use super::{Condition, Expr, JoinType, Junction, SortOrder};
use crate::transpiler::encryption::EncryptionConfig;

/// A SELECT, also used for derived tables, `refer` subqueries and scoped `json` sources.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectQuery {
    pub table: String,
    pub alias: Option<String>,
    /// Empty means `*`.
    pub select: Vec<Expr>,
    pub joins: Vec<JoinSpec>,
    pub filter: Option<Condition>,
    pub junction: Junction,
    pub group_by: Vec<Expr>,
    pub having: Option<Condition>,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub encryption: Option<EncryptionConfig>,
}

impl SelectQuery {
    /// True when anything beyond a bare table reference is present.
    pub fn is_derived(&self) -> bool {
        !self.select.is_empty()
            || !self.joins.is_empty()
            || self.filter.is_some()
            || !self.group_by.is_empty()
            || self.having.is_some()
            || !self.order_by.is_empty()
            || self.limit.is_some()
            || self.offset.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub column: Expr,
    pub order: SortOrder,
}

/// Join condition: `USING (...)` columns or `ON parent = child` pairs.
#[derive(Debug, Clone, PartialEq)]
pub enum Using {
    Columns(Vec<String>),
    /// Parent column paired with a child column or a nested condition.
    Pairs(Vec<(String, Expr)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    pub join_type: JoinType,
    pub using: Option<Using>,
    /// Target table and, when derived, the full subquery.
    pub query: SelectQuery,
}

impl JoinSpec {
    pub fn is_derived(&self) -> bool {
        self.query.is_derived()
    }
}

/// INSERT (single or bulk), UPDATE, or upsert.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WriteQuery {
    pub table: String,
    pub alias: Option<String>,
    /// Column/value pairs per row; one row unless the input was a list.
    pub rows: Vec<Vec<(String, Expr)>>,
    pub filter: Option<Condition>,
    pub junction: Junction,
    pub upsert: Vec<(String, Expr)>,
    pub indexes: Vec<String>,
    pub encrypt: Vec<(String, EncryptionConfig)>,
    pub encryption: Option<EncryptionConfig>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteQuery {
    pub table: String,
    pub alias: Option<String>,
    pub filter: Option<Condition>,
    pub junction: Junction,
    pub encryption: Option<EncryptionConfig>,
}
