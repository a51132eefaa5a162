use serde::{Deserialize, Serialize};

use crate::{
    domain::{FieldDefinition, FieldSchema, Layout},
    form::ConfigError,
};

use super::layout::{RenderPlan, resolve_layout};

/// A form as stored on disk: field definitions plus their grid placement.
///
/// An empty layout stacks every visible field in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub layout: Layout,
}

impl FormDocument {
    pub fn schema(&self) -> Result<FieldSchema, ConfigError> {
        FieldSchema::new(self.fields.iter().cloned())
    }

    pub fn effective_layout(&self) -> Layout {
        if !self.layout.is_empty() {
            return self.layout.clone();
        }
        Layout::stacked(
            self.fields
                .iter()
                .filter(|field| !field.hidden)
                .map(|field| field.name.as_str()),
        )
    }

    /// Build the schema and resolve its render order in one go.
    pub fn resolve(&self) -> Result<(FieldSchema, RenderPlan), ConfigError> {
        let schema = self.schema()?;
        let plan = resolve_layout(&schema, &self.effective_layout())?;
        Ok((schema, plan))
    }
}
