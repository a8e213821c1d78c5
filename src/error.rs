//! Error types for the compiler.

use thiserror::Error;

use crate::transpiler::Dialect;

/// Machine-checkable classification of a [`CompileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingParameter,
    InvalidValue,
    UnsupportedByDialect,
    UnknownSignature,
}

/// The main error type for compilation.
///
/// Every kind aborts the compile it is raised in. Optional clause containers of the
/// wrong shape are not errors at all: they are dropped and reported through
/// [`Compiled::warnings`](crate::transpiler::Compiled::warnings).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// A required field is absent (join `table`, padding `length`, substring `start`...).
    #[error("Missing parameter '{param}' in {context}")]
    MissingParameter { param: String, context: String },

    /// A field holds a value outside its allowed set or of the wrong type.
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// The requested feature has no equivalent in the active dialect.
    #[error("'{feature}' is not supported by {dialect}")]
    UnsupportedByDialect { feature: String, dialect: Dialect },

    /// An unrecognized key in a select, where or option position.
    #[error("Unknown signature '{key}' in {position}")]
    UnknownSignature { key: String, position: String },
}

impl CompileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingParameter { .. } => ErrorKind::MissingParameter,
            Self::InvalidValue { .. } => ErrorKind::InvalidValue,
            Self::UnsupportedByDialect { .. } => ErrorKind::UnsupportedByDialect,
            Self::UnknownSignature { .. } => ErrorKind::UnknownSignature,
        }
    }

    /// Create a missing parameter error.
    pub fn missing(param: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingParameter {
            param: param.into(),
            context: context.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unsupported(feature: impl Into<String>, dialect: Dialect) -> Self {
        Self::UnsupportedByDialect {
            feature: feature.into(),
            dialect,
        }
    }

    pub fn unknown(key: impl Into<String>, position: impl Into<String>) -> Self {
        Self::UnknownSignature {
            key: key.into(),
            position: position.into(),
        }
    }
}

/// Result type alias for compiler operations.
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CompileError::missing("length", "str.padding.left");
        assert_eq!(
            err.to_string(),
            "Missing parameter 'length' in str.padding.left"
        );
        assert_eq!(err.kind(), ErrorKind::MissingParameter);
    }

    #[test]
    fn test_unsupported_names_dialect() {
        let err = CompileError::unsupported("reverse", Dialect::Sqlite);
        assert_eq!(err.to_string(), "'reverse' is not supported by sqlite");
        assert_eq!(err.kind(), ErrorKind::UnsupportedByDialect);
    }
}
