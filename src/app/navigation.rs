use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::{
    domain::{FieldKind, FieldSchema},
    schema::RenderPlan,
};

/// Id of the submit control appended by [`FocusRing::with_submit`].
pub const SUBMIT_CONTROL: &str = "submit";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Input,
    TextArea,
    Select,
    Submit,
    Button,
    /// Icon-only button inside an input adornment. Never focused by Enter.
    Adornment,
}

impl ControlKind {
    fn for_field(kind: &FieldKind, multiline: bool) -> Self {
        match kind {
            FieldKind::Select { .. } | FieldKind::SearchSelect { .. } => ControlKind::Select,
            FieldKind::String if multiline => ControlKind::TextArea,
            FieldKind::String
            | FieldKind::Number
            | FieldKind::Email
            | FieldKind::Date
            | FieldKind::Time
            | FieldKind::Color => ControlKind::Input,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Control {
    pub id: String,
    pub kind: ControlKind,
    pub disabled: bool,
    /// Select with its option list open, waiting for Enter to commit.
    pub expanded: bool,
}

impl Control {
    pub fn new(id: impl Into<String>, kind: ControlKind) -> Self {
        Self {
            id: id.into(),
            kind,
            disabled: false,
            expanded: false,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn focusable(&self) -> bool {
        !self.disabled && self.kind != ControlKind::Adornment
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnterOutcome {
    /// Key is not ours; let the focused control handle it.
    PassThrough,
    MoveFocus(String),
    /// Enter swallowed with nowhere to go.
    Suppressed,
}

/// Declared tab order of a form.
#[derive(Clone, Debug, Default)]
pub struct FocusRing {
    controls: Vec<Control>,
}

impl FocusRing {
    /// Controls for every rendered field, row-major.
    pub fn from_plan(schema: &FieldSchema, plan: &RenderPlan) -> Self {
        let controls = plan
            .field_names()
            .filter_map(|name| schema.field(name))
            .map(|field| {
                let mut control =
                    Control::new(&field.name, ControlKind::for_field(&field.kind, field.multiline));
                control.disabled = field.disabled;
                control
            })
            .collect();
        Self { controls }
    }

    pub fn with_submit(mut self) -> Self {
        self.push(Control::new(SUBMIT_CONTROL, ControlKind::Submit));
        self
    }

    pub fn push(&mut self, control: Control) {
        self.controls.retain(|existing| existing.id != control.id);
        self.controls.push(control);
    }

    /// Place `control` right after `anchor`, e.g. an adornment next to its input.
    pub fn insert_after(&mut self, anchor: &str, control: Control) {
        self.controls.retain(|existing| existing.id != control.id);
        match self.position(anchor) {
            Some(idx) => self.controls.insert(idx + 1, control),
            None => self.controls.push(control),
        }
    }

    pub fn control(&self, id: &str) -> Option<&Control> {
        self.controls.iter().find(|control| control.id == id)
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn set_disabled(&mut self, id: &str, disabled: bool) -> bool {
        self.control_mut(id)
            .map(|control| control.disabled = disabled)
            .is_some()
    }

    pub fn set_expanded(&mut self, id: &str, expanded: bool) -> bool {
        self.control_mut(id)
            .map(|control| control.expanded = expanded)
            .is_some()
    }

    /// Ids that Enter can land on, in order.
    pub fn focus_order(&self) -> impl Iterator<Item = &str> {
        self.controls
            .iter()
            .filter(|control| control.focusable())
            .map(|control| control.id.as_str())
    }

    pub fn submit(&self) -> Option<&Control> {
        self.controls
            .iter()
            .find(|control| control.kind == ControlKind::Submit)
    }

    /// Next focusable non-submit control after `id`.
    pub fn next_after(&self, id: &str) -> Option<&Control> {
        let start = self.position(id)?;
        self.controls[start + 1..]
            .iter()
            .find(|control| control.focusable() && control.kind != ControlKind::Submit)
    }

    pub fn handle_enter(&self, focused: &str, key: &KeyEvent) -> EnterOutcome {
        if !is_plain_enter(key) {
            return EnterOutcome::PassThrough;
        }
        let Some(current) = self.control(focused) else {
            return EnterOutcome::PassThrough;
        };
        match current.kind {
            ControlKind::TextArea | ControlKind::Submit => return EnterOutcome::PassThrough,
            ControlKind::Select if current.expanded => return EnterOutcome::PassThrough,
            _ => {}
        }
        if let Some(next) = self.next_after(focused) {
            return EnterOutcome::MoveFocus(next.id.clone());
        }
        match self.submit() {
            Some(submit) if submit.focusable() => EnterOutcome::MoveFocus(submit.id.clone()),
            _ => EnterOutcome::Suppressed,
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.controls.iter().position(|control| control.id == id)
    }

    fn control_mut(&mut self, id: &str) -> Option<&mut Control> {
        self.controls.iter_mut().find(|control| control.id == id)
    }
}

fn is_plain_enter(key: &KeyEvent) -> bool {
    key.code == KeyCode::Enter && key.kind != KeyEventKind::Release && key.modifiers.is_empty()
}
