use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use textwrap::wrap;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::{
    app::SUBMIT_CONTROL,
    domain::{FieldDefinition, FieldKind},
    form::FormEngine,
};

use super::grid::{FIELD_HEIGHT, cell_rect};

pub fn render_fields(frame: &mut Frame<'_>, area: Rect, engine: &FormEngine, submit_label: &str) {
    if engine.plan().is_empty() {
        let placeholder = Paragraph::new("This form has no visible fields")
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(placeholder, area);
        return;
    }

    let mut row_index = 0u16;
    let mut current_row = None;
    for slot in engine.plan().slots() {
        if current_row.is_some_and(|row| row != slot.cell.row_start) {
            row_index += 1;
        }
        current_row = Some(slot.cell.row_start);
        let top = area.y.saturating_add(row_index.saturating_mul(FIELD_HEIGHT));
        let rect = cell_rect(area, slot.cell, top);
        if rect.height < 3 || rect.width < 4 {
            continue;
        }
        let Some(definition) = engine.schema().field(&slot.field) else {
            continue;
        };
        render_field(frame, rect, engine, definition);
    }

    if engine.focus_ring().submit().is_some() {
        let top = area
            .y
            .saturating_add((row_index + 1).saturating_mul(FIELD_HEIGHT));
        if top < area.bottom() {
            let rect = Rect::new(area.x, top, area.width, 1);
            render_submit(frame, rect, engine, submit_label);
        }
    }
}

fn render_field(frame: &mut Frame<'_>, area: Rect, engine: &FormEngine, field: &FieldDefinition) {
    let state = engine.state();
    let focused = engine.focused() == Some(field.name.as_str());
    let error = state.error(&field.name);
    let pending = state.is_pending(&field.name);

    let mut title = field.display_label();
    if field.required {
        title.push_str(" *");
    }
    if pending {
        title.push_str(" …");
    }
    let border_style = if error.is_some() {
        Style::default().fg(Color::Red)
    } else if focused {
        Style::default().fg(Color::Yellow)
    } else if field.disabled {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(title, border_style.add_modifier(Modifier::BOLD)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width as usize;
    let value = display_value(field, state.value(&field.name));
    let value_style = if field.disabled {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White)
    };
    let mut lines = vec![Line::from(Span::styled(clamp_value(&value, width), value_style))];
    if let Some(message) = error {
        let budget = inner.height.saturating_sub(1) as usize;
        lines.extend(error_lines(message, width).into_iter().take(budget));
    }
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_submit(frame: &mut Frame<'_>, area: Rect, engine: &FormEngine, label: &str) {
    let focused = engine.focused() == Some(SUBMIT_CONTROL);
    let text = if engine.state().submitting {
        "[ Saving... ]".to_string()
    } else {
        format!("[ {label} ]")
    };
    let style = if focused {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Yellow)
    };
    frame.render_widget(Paragraph::new(Line::from(Span::styled(text, style))), area);
}

/// Select fields show the label of the chosen option, not its raw value.
fn display_value(field: &FieldDefinition, raw: &str) -> String {
    match &field.kind {
        FieldKind::Select { options } | FieldKind::SearchSelect { options } => options
            .iter()
            .find(|option| option.value_text() == raw)
            .map(|option| option.label.clone())
            .unwrap_or_else(|| raw.to_string()),
        FieldKind::String if field.multiline => raw.replace('\n', " ⏎ "),
        FieldKind::String
        | FieldKind::Number
        | FieldKind::Email
        | FieldKind::Date
        | FieldKind::Time
        | FieldKind::Color => raw.to_string(),
    }
}

fn error_lines(message: &str, width: usize) -> Vec<Line<'static>> {
    let style = Style::default().fg(Color::Red).add_modifier(Modifier::BOLD);
    wrap(&format!("⚠ {message}"), width.max(4))
        .into_iter()
        .map(|segment| Line::from(Span::styled(segment.into_owned(), style)))
        .collect()
}

/// Cut `value` to `max_width` terminal columns, marking the cut with `…`.
pub(crate) fn clamp_value(value: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(value) <= max_width {
        return value.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut result = String::new();
    let mut width = 0usize;
    for ch in value.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + ch_width + 1 > max_width {
            break;
        }
        result.push(ch);
        width += ch_width;
    }
    result.push('…');
    result
}
