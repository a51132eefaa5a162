use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::Span,
    widgets::Paragraph,
};

use crate::form::FormEngine;

use super::components::{render_banner, render_fields, render_footer};

pub struct UiContext<'a> {
    pub engine: &'a FormEngine,
    pub title: Option<&'a str>,
    pub help: Option<&'a str>,
}

impl<'a> UiContext<'a> {
    pub fn new(engine: &'a FormEngine) -> Self {
        Self {
            engine,
            title: None,
            help: None,
        }
    }

    pub fn with_title(mut self, title: &'a str) -> Self {
        self.title = Some(title);
        self
    }

    pub fn with_help(mut self, help: &'a str) -> Self {
        self.help = Some(help);
        self
    }
}

/// Title, submit-error banner, field grid and status footer, top to bottom.
pub fn draw(frame: &mut Frame<'_>, ctx: UiContext<'_>) {
    let banner = ctx.engine.state().banner.as_deref();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(u16::from(ctx.title.is_some())),
            Constraint::Length(if banner.is_some() { 3 } else { 0 }),
            Constraint::Min(4),
            Constraint::Length(if ctx.help.is_some() { 2 } else { 1 }),
        ])
        .split(frame.area());

    if let Some(title) = ctx.title {
        let heading = Span::styled(title.to_string(), Style::default().add_modifier(Modifier::BOLD));
        frame.render_widget(Paragraph::new(heading), chunks[0]);
    }
    if let Some(message) = banner {
        render_banner(frame, chunks[1], message);
    }
    let submit_label = ctx.engine.options().submit_label.clone();
    render_fields(frame, chunks[2], ctx.engine, &submit_label);
    render_footer(frame, chunks[3], &ctx);
}
