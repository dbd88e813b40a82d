//! Query commands and their lowering into parameterized SQL.

mod command;
mod generator;
mod sql;
mod where_compiler;

pub use command::{Paging, QueryBuilder, QueryCommand};
pub use generator::QueryGenerator;
pub use sql::{quote_identifier, DacParameter, SqlCommandInfo};

pub(crate) use where_compiler::{resolve_member, ColumnRef};

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
