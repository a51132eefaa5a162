use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use super::super::view::UiContext;

pub fn render_footer(frame: &mut Frame<'_>, area: Rect, ctx: &UiContext<'_>) {
    let engine = ctx.engine;
    let state = engine.state();
    let errors = state.error_count();

    let mut status = engine.status().message().to_string();
    if state.is_dirty() {
        status.push_str(" • unsaved changes");
    }
    if !state.pending_async.is_empty() {
        status.push_str(&format!(" • checking: {}", state.pending_async.len()));
    }
    if status.trim().is_empty() {
        status = "Ready".to_string();
    }

    let badge = if errors > 0 {
        Span::styled(
            format!("[! {errors}]"),
            Style::default().fg(Color::Red).bg(Color::Black),
        )
    } else {
        Span::styled("[ok]", Style::default().fg(Color::Green))
    };

    let mut lines = vec![Line::from(vec![
        Span::raw("Status: "),
        Span::raw(status),
        Span::raw(" "),
        badge,
    ])];
    if let Some(help) = ctx.help {
        lines.push(Line::from(Span::styled(
            format!("Actions: {help}"),
            Style::default().fg(Color::Yellow),
        )));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
}
