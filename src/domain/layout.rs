use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Column count of the layout grid.
pub const GRID_COLUMNS: u16 = 12;

/// Position of one field in the grid. Rows and columns are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutCell {
    pub row_start: u16,
    pub col_start: u16,
    #[serde(default = "default_span")]
    pub col_span: u16,
}

impl LayoutCell {
    pub const fn new(row_start: u16, col_start: u16, col_span: u16) -> Self {
        Self {
            row_start,
            col_start,
            col_span,
        }
    }

    /// Full-width cell on the given row.
    pub const fn row(row_start: u16) -> Self {
        Self::new(row_start, 1, GRID_COLUMNS)
    }

    /// Last column covered by the cell (inclusive).
    /// Saturates, so absurd documents stay out of bounds instead of wrapping.
    pub fn col_end(&self) -> u16 {
        self.col_start.saturating_add(self.col_span).saturating_sub(1)
    }

    pub fn fits_grid(&self) -> bool {
        self.row_start >= 1
            && self.col_start >= 1
            && self.col_span >= 1
            && self.col_end() <= GRID_COLUMNS
    }

    pub fn overlaps(&self, other: &LayoutCell) -> bool {
        self.row_start == other.row_start
            && self.col_start <= other.col_end()
            && other.col_start <= self.col_end()
    }
}

fn default_span() -> u16 {
    GRID_COLUMNS
}

/// Field name to grid cell mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layout {
    cells: IndexMap<String, LayoutCell>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cell(mut self, field: impl Into<String>, cell: LayoutCell) -> Self {
        self.cells.insert(field.into(), cell);
        self
    }

    /// One full-width row per field, in the given order.
    pub fn stacked<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cells = fields
            .into_iter()
            .enumerate()
            .map(|(idx, name)| (name.into(), LayoutCell::row(idx as u16 + 1)))
            .collect();
        Self { cells }
    }

    pub fn cell(&self, field: &str) -> Option<LayoutCell> {
        self.cells.get(field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, LayoutCell)> {
        self.cells.iter().map(|(name, cell)| (name.as_str(), *cell))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_requires_same_row_and_shared_columns() {
        let left = LayoutCell::new(1, 1, 6);
        let right = LayoutCell::new(1, 7, 6);
        let wide = LayoutCell::new(1, 5, 4);
        assert!(!left.overlaps(&right));
        assert!(left.overlaps(&wide));
        assert!(wide.overlaps(&right));
        assert!(!left.overlaps(&LayoutCell::new(2, 1, 6)));
    }

    #[test]
    fn huge_columns_do_not_wrap_into_the_grid() {
        let cell = LayoutCell::new(1, u16::MAX, 2);
        assert_eq!(cell.col_end(), u16::MAX - 1);
        assert!(!cell.fits_grid());
        assert!(!LayoutCell::new(1, 1, u16::MAX).fits_grid());
    }

    #[test]
    fn grid_bounds() {
        assert!(LayoutCell::new(1, 7, 6).fits_grid());
        assert!(!LayoutCell::new(1, 8, 6).fits_grid());
        assert!(!LayoutCell::new(0, 1, 6).fits_grid());
        assert!(!LayoutCell::new(1, 1, 0).fits_grid());
    }
}
