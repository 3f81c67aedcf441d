//! Logical column types and the runtime value model.
//!
//! - [`DataType`]: the closed set of column types a table may declare.
//! - [`Value`]: the tagged union flowing through records, predicates, and
//!   projections at runtime.

mod data_type;
mod value;

pub use data_type::DataType;
pub use value::{Value, ValueKind};
