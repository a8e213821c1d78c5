//! DML (Data Manipulation Language) SQL generation.
//!
//! SELECT (also reused for derived tables, `refer` and scoped `json`), INSERT/UPDATE/upsert
//! and DELETE.

pub mod delete;
pub mod select;
pub mod write;
