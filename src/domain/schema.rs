use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::form::ConfigError;

/// Closed set of editable field kinds. Select kinds carry their options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FieldKind {
    String,
    Number,
    Email,
    Date,
    Time,
    Select {
        #[serde(default)]
        options: Vec<SelectOption>,
    },
    SearchSelect {
        #[serde(default)]
        options: Vec<SelectOption>,
    },
    Color,
}

impl FieldKind {
    pub fn options(&self) -> &[SelectOption] {
        match self {
            FieldKind::Select { options } | FieldKind::SearchSelect { options } => options,
            FieldKind::String
            | FieldKind::Number
            | FieldKind::Email
            | FieldKind::Date
            | FieldKind::Time
            | FieldKind::Color => &[],
        }
    }

    pub fn is_select(&self) -> bool {
        matches!(self, FieldKind::Select { .. } | FieldKind::SearchSelect { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: Value,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Text form of the option value, as stored in the form while editing.
    pub fn value_text(&self) -> String {
        value_to_text(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub multiline: bool,
    #[serde(default)]
    pub hidden: bool,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
            min_length: None,
            max_length: None,
            min: None,
            max: None,
            regex: None,
            pattern_message: None,
            default_value: None,
            disabled: false,
            multiline: false,
            hidden: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_regex(mut self, pattern: impl Into<String>) -> Self {
        self.regex = Some(pattern.into());
        self
    }

    pub fn with_pattern_message(mut self, message: impl Into<String>) -> Self {
        self.pattern_message = Some(message.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn display_label(&self) -> String {
        if self.label.trim().is_empty() {
            prettify_label(&self.name)
        } else {
            self.label.clone()
        }
    }

    /// Initial editing text derived from `defaultValue`.
    pub fn default_text(&self) -> String {
        self.default_value
            .as_ref()
            .map(value_to_text)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
struct SchemaEntry {
    definition: FieldDefinition,
    pattern: Option<Regex>,
}

/// Validated, name-keyed field set in declaration order.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    entries: IndexMap<String, SchemaEntry>,
}

impl FieldSchema {
    pub fn new(fields: impl IntoIterator<Item = FieldDefinition>) -> Result<Self, ConfigError> {
        let mut entries = IndexMap::new();
        for definition in fields {
            if entries.contains_key(&definition.name) {
                return Err(ConfigError::DuplicateField {
                    name: definition.name,
                });
            }
            let pattern = match definition.regex.as_deref() {
                Some(raw) => Some(Regex::new(raw).map_err(|err| ConfigError::InvalidPattern {
                    name: definition.name.clone(),
                    message: err.to_string(),
                })?),
                None => None,
            };
            entries.insert(
                definition.name.clone(),
                SchemaEntry {
                    definition,
                    pattern,
                },
            );
        }
        Ok(Self { entries })
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.entries.get(name).map(|entry| &entry.definition)
    }

    pub fn pattern(&self, name: &str) -> Option<&Regex> {
        self.entries.get(name).and_then(|entry| entry.pattern.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.entries.values().map(|entry| &entry.definition)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn prettify_label(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut capitalize = true;
    for ch in raw.chars() {
        if ch == '_' || ch == '-' {
            result.push(' ');
            capitalize = true;
            continue;
        }
        if capitalize {
            result.push(ch.to_ascii_uppercase());
            capitalize = false;
        } else {
            result.push(ch);
        }
    }
    result.trim().to_string()
}
