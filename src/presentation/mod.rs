mod components;
mod view;

pub use components::{FIELD_HEIGHT, cell_rect};
pub use view::{UiContext, draw};
