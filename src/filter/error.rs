use thiserror::Error;

/// Rejections raised while turning list parameters and registry filters
/// into a query. All but `InvalidPattern` come from client input or table
/// definitions and surface as 400.
#[derive(Error, Debug)]
pub enum FilterError {
    /// Table names must be plain identifiers before they are quoted.
    #[error("'{0}' is not a valid table name")]
    InvalidTableName(String),

    #[error("'{0}' is not a valid column name")]
    InvalidColumn(String),

    #[error("Malformed where clause: {0}")]
    InvalidWhereClause(String),

    #[error("Operator '{0}' is not supported")]
    UnsupportedOperator(String),

    #[error("Bad operand: {0}")]
    InvalidOperatorData(String),

    /// Negative `limit` or `offset`.
    #[error("{field} must not be negative (got {value})")]
    NegativeWindow { field: &'static str, value: i32 },

    /// A registry `filter` that is not a `field.operator.value` triple.
    #[error("Invalid status filter '{0}': expected field.operator.value")]
    InvalidStatusFilter(String),

    /// `?status=` names an option the table does not declare.
    #[error("Unknown status '{status}' for table '{table}'")]
    UnknownStatus { table: String, status: String },

    /// A LIKE pattern that failed to compile for in-memory matching.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
