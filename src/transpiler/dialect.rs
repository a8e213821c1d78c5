use serde::{Deserialize, Serialize};

use crate::transpiler::sql::mysql::MysqlGenerator;
use crate::transpiler::sql::postgres::PostgresGenerator;
use crate::transpiler::sql::sqlite::SqliteGenerator;
use crate::transpiler::traits::SqlGenerator;

/// Supported SQL Dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Dialect {
    #[default]
    #[serde(rename = "mysql")]
    MySql,
    #[serde(rename = "postgresql", alias = "postgres")]
    Postgres,
    #[serde(rename = "sqlite")]
    Sqlite,
}

impl Dialect {
    pub fn generator(&self) -> &'static dyn SqlGenerator {
        match self {
            Dialect::MySql => &MysqlGenerator,
            Dialect::Postgres => &PostgresGenerator,
            Dialect::Sqlite => &SqliteGenerator,
        }
    }

    /// Placeholders are plain `?` bound by position.
    pub fn is_positional(&self) -> bool {
        !matches!(self, Dialect::Postgres)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgresql",
            Dialect::Sqlite => "sqlite",
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
