//! In-memory backend: the client contracts over process-local tables, plus
//! a reference query engine evaluating `QueryCommand`s directly.

mod backend;
mod engine;

pub use backend::{MemoryBackend, MemoryTable};
pub use engine::QueryRow;
