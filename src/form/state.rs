use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};

use crate::domain::{FieldSchema, value_to_text};

/// Field name to editing text.
pub type FormValues = IndexMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormPhase {
    Idle,
    Editing,
    Validating,
    Submitting,
    Success,
    SubmitError,
}

#[derive(Debug, Clone)]
pub struct FormState {
    pub values: FormValues,
    pub errors: IndexMap<String, String>,
    pub pending_async: IndexSet<String>,
    pub submitting: bool,
    pub phase: FormPhase,
    pub banner: Option<String>,
    dirty: IndexSet<String>,
}

impl FormState {
    /// Seed values from `initial`, falling back to schema defaults.
    pub fn from_schema(schema: &FieldSchema, initial: Option<&Map<String, Value>>) -> Self {
        let values = schema
            .fields()
            .map(|field| {
                let text = initial
                    .and_then(|values| values.get(&field.name))
                    .map(value_to_text)
                    .unwrap_or_else(|| field.default_text());
                (field.name.clone(), text)
            })
            .collect();
        Self {
            values,
            errors: IndexMap::new(),
            pending_async: IndexSet::new(),
            submitting: false,
            phase: FormPhase::Idle,
            banner: None,
            dirty: IndexSet::new(),
        }
    }

    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or("")
    }

    /// Store new text. Returns `false` when the value did not change.
    pub fn set_value(&mut self, field: &str, value: String) -> bool {
        if self.values.get(field) == Some(&value) {
            return false;
        }
        self.values.insert(field.to_string(), value);
        self.dirty.insert(field.to_string());
        true
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn set_error(&mut self, field: &str, message: Option<String>) {
        match message {
            Some(message) => {
                self.errors.insert(field.to_string(), message);
            }
            None => {
                self.errors.shift_remove(field);
            }
        }
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_pending(&self, field: &str) -> bool {
        self.pending_async.contains(field)
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn is_field_dirty(&self, field: &str) -> bool {
        self.dirty.contains(field)
    }

    /// No field errors and nothing waiting on an async check.
    pub fn can_submit(&self) -> bool {
        self.errors.is_empty() && self.pending_async.is_empty()
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty.clear();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::{FieldDefinition, FieldKind};

    #[test]
    fn seeds_from_initial_values_then_defaults() {
        let schema = FieldSchema::new([
            FieldDefinition::new("nombre", "Nombre", FieldKind::String).with_default("Nuevo"),
            FieldDefinition::new("precio", "Precio", FieldKind::Number).with_default(10),
            FieldDefinition::new("color", "Color", FieldKind::Color),
        ])
        .expect("schema");
        let initial = json!({"precio": 25});
        let state = FormState::from_schema(&schema, initial.as_object());
        assert_eq!(state.value("nombre"), "Nuevo");
        assert_eq!(state.value("precio"), "25");
        assert_eq!(state.value("color"), "");
        assert_eq!(state.phase, FormPhase::Idle);
        assert!(!state.is_dirty());
    }

    #[test]
    fn unchanged_value_is_not_dirty() {
        let schema = FieldSchema::new([FieldDefinition::new("nombre", "Nombre", FieldKind::String)])
            .expect("schema");
        let mut state = FormState::from_schema(&schema, None);
        assert!(!state.set_value("nombre", String::new()));
        assert!(state.set_value("nombre", "Ana".into()));
        assert!(state.is_field_dirty("nombre"));
    }
}
