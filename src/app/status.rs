#[derive(Debug, Clone)]
pub struct StatusLine {
    message: String,
}

pub const READY_STATUS: &str = "Ready. Enter moves to the next field.";

impl Default for StatusLine {
    fn default() -> Self {
        Self {
            message: READY_STATUS.to_string(),
        }
    }
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_raw(&mut self, msg: impl Into<String>) {
        self.message = msg.into();
    }

    pub fn ready(&mut self) {
        self.message = READY_STATUS.to_string();
    }

    pub fn editing(&mut self, label: &str) {
        self.message = format!("Editing {label}");
    }

    pub fn validating(&mut self, count: usize) {
        self.message = format!("Checking {count} field(s)...");
    }

    pub fn issues_remaining(&mut self, count: usize) {
        self.message = format!("{count} issue(s) remaining");
    }

    pub fn submitting(&mut self) {
        self.message = "Saving...".to_string();
    }

    pub fn saved(&mut self) {
        self.message = "Saved".to_string();
    }

    pub fn submit_failed(&mut self) {
        self.message = "Save failed. Your changes are still here.".to_string();
    }

    pub fn submit_cancelled(&mut self) {
        self.message = "Save cancelled. Your changes are still here.".to_string();
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
