pub mod navigation;
mod options;
mod status;

pub use navigation::{Control, ControlKind, EnterOutcome, FocusRing, SUBMIT_CONTROL};
pub use options::{DEFAULT_DEBOUNCE, FormOptions, UNVERIFIED_MESSAGE};
pub use status::{READY_STATUS, StatusLine};
