//! Structure type reflection, schema building, and the schema registry.

mod accessors;
mod builder;
mod error;
mod names;
mod reflector;
mod registry;
#[allow(clippy::module_inception)]
mod schema;

pub use accessors::{IdAccessor, IndexAccessor};
pub use builder::SchemaBuilder;
pub use error::SchemaError;
pub use names::{
    column_name_for_path, DbSchemaNames, JSON_COLUMN, SORT_ORDER_COLUMN, STRUCTURE_ID_COLUMN,
};
pub use reflector::{IdMember, IndexMember, StructureType, StructureTypeReflector};
pub use registry::StructureSchemas;
pub use schema::StructureSchema;

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
