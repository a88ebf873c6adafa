pub mod sql;
pub mod tables;
pub mod types;

pub use sql::{copy_sql, create_table_sql};
pub use types::{compare_header, ColumnSpec, SqlType, TableSchema};
