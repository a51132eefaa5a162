use ratatui::layout::Rect;

use crate::domain::{GRID_COLUMNS, LayoutCell};

/// Rows a single field occupies: bordered box with value and error lines.
pub const FIELD_HEIGHT: u16 = 4;

/// Screen area of `cell` when its grid row starts at `top`.
///
/// Column edges are computed proportionally so adjacent cells share borders
/// without gaps, whatever the terminal width.
pub fn cell_rect(area: Rect, cell: LayoutCell, top: u16) -> Rect {
    let columns = u32::from(GRID_COLUMNS);
    let width = u32::from(area.width);
    let left = width * u32::from(cell.col_start.saturating_sub(1)) / columns;
    let right = width * u32::from(cell.col_end().min(GRID_COLUMNS)) / columns;
    let bottom = area.bottom();
    let height = FIELD_HEIGHT.min(bottom.saturating_sub(top));
    Rect {
        x: area.x + left as u16,
        y: top,
        width: right.saturating_sub(left) as u16,
        height,
    }
}
