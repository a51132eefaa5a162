mod layout;
mod loader;

pub use layout::{RenderPlan, RenderSlot, resolve_layout};
pub use loader::FormDocument;
