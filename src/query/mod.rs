//! Statement building shared by every resource.
//!
//! Nothing in here touches the database: the filter compiler and the partial-update
//! binder both produce SQL text plus an ordered list of values, and the repository is
//! the only place those two halves meet a connection.

pub mod filter;
pub mod outcome;
pub mod partial;

pub use filter::{
    CompiledFilter, Criteria, FilterDescriptor, FilterMode, FilterTable, FilterValue, Operator,
    RangeRule, compile,
};
pub use outcome::{require_row, require_rows};
pub use partial::{PartialUpdate, SparseFields, bind_partial_update};

/// SqlValue
///
/// A single bound parameter. Placeholders are numbered by position in the list that
/// carries these values, so order is significant everywhere they appear.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i32),
    Float(f64),
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}
