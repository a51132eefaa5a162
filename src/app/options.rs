use std::{borrow::Cow, time::Duration};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);
pub const UNVERIFIED_MESSAGE: &str = "Could not validate this value, try again";

#[derive(Debug, Clone)]
pub struct FormOptions {
    /// Quiet period before an async validator is called.
    pub debounce: Duration,
    /// Committed when an async validator itself fails.
    pub unverified_message: Cow<'static, str>,
    pub submit_label: Cow<'static, str>,
    /// Reseed values from schema defaults after a successful submit.
    pub reset_on_success: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            unverified_message: Cow::Borrowed(UNVERIFIED_MESSAGE),
            submit_label: Cow::Borrowed("Save"),
            reset_on_success: false,
        }
    }
}

impl FormOptions {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_unverified_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.unverified_message = message.into();
        self
    }

    pub fn with_submit_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.submit_label = label.into();
        self
    }

    pub fn with_reset_on_success(mut self, enabled: bool) -> Self {
        self.reset_on_success = enabled;
        self
    }
}
