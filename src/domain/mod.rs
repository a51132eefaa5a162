mod layout;
mod schema;

pub(crate) use schema::value_to_text;
pub use layout::{GRID_COLUMNS, Layout, LayoutCell};
pub use schema::{FieldDefinition, FieldKind, FieldSchema, SelectOption};
