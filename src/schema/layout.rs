use tracing::debug;

use crate::{
    domain::{FieldSchema, Layout, LayoutCell},
    form::ConfigError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSlot {
    pub field: String,
    pub cell: LayoutCell,
}

/// Render sequence for a form, sorted row-major by `(row_start, col_start)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderPlan {
    slots: Vec<RenderSlot>,
}

impl RenderPlan {
    pub fn slots(&self) -> &[RenderSlot] {
        &self.slots
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.field.as_str())
    }

    pub fn cell(&self, field: &str) -> Option<LayoutCell> {
        self.slots
            .iter()
            .find(|slot| slot.field == field)
            .map(|slot| slot.cell)
    }

    /// Number of grid rows the plan spans.
    pub fn row_count(&self) -> u16 {
        self.slots
            .iter()
            .map(|slot| slot.cell.row_start)
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Pair every visible schema field with its grid cell.
///
/// Hidden fields are left out of the plan. Every other field needs a cell,
/// cells must fit the grid and must not overlap.
pub fn resolve_layout(schema: &FieldSchema, layout: &Layout) -> Result<RenderPlan, ConfigError> {
    for (name, _) in layout.iter() {
        if !schema.contains(name) {
            return Err(ConfigError::UnknownLayoutField {
                name: name.to_string(),
            });
        }
    }

    let mut slots: Vec<RenderSlot> = Vec::with_capacity(schema.len());
    for field in schema.fields() {
        let cell = layout.cell(&field.name);
        if field.hidden {
            if cell.is_some() {
                debug!(field = %field.name, "hidden field has a layout cell; skipping");
            }
            continue;
        }
        let cell = cell.ok_or_else(|| ConfigError::MissingLayout {
            name: field.name.clone(),
        })?;
        if !cell.fits_grid() {
            return Err(ConfigError::CellOutOfBounds {
                name: field.name.clone(),
            });
        }
        if let Some(existing) = slots.iter().find(|slot| slot.cell.overlaps(&cell)) {
            return Err(ConfigError::OverlappingCells {
                first: existing.field.clone(),
                second: field.name.clone(),
            });
        }
        slots.push(RenderSlot {
            field: field.name.clone(),
            cell,
        });
    }

    slots.sort_by_key(|slot| (slot.cell.row_start, slot.cell.col_start));
    Ok(RenderPlan { slots })
}
