//! Core of a document store that persists typed structures into a
//! relational backend.
//!
//! Provides structure reflection and schema building, predicate/sort/include
//! expression parsing and SQL lowering, schema synchronization, and the bulk
//! structure-loading pipeline.

pub mod bulk;
pub mod client;
pub mod config;
pub mod error;
pub mod lambdas;
pub mod memory;
pub mod persistence;
pub mod query;
pub mod schema;
pub mod session;
pub mod structure;
pub mod sync;
pub mod value;

pub use error::{Result, StructureError};
pub use structure::{Structure, StructureId};
pub use value::{DataType, Value};
