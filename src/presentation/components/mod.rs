mod banner;
mod fields;
mod footer;
mod grid;

pub use banner::render_banner;
pub use fields::render_fields;
pub use footer::render_footer;
pub use grid::{FIELD_HEIGHT, cell_rect};
