mod format;
mod input;
mod output;

pub use format::DocumentFormat;
pub use input::{load_form_document, parse_document_str};
pub use output::render_value;
