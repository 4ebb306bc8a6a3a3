use ratatui::{
    Frame,
    style::{Color, Style},
    widgets::{Paragraph, Wrap},
};

use crate::controller::{Notice, ViewState};

mod list;
mod view;
mod compose;

pub struct Screen<'a> {
    pub state: &'a ViewState,
    pub notice: Option<&'a Notice>,
    pub loading: bool,
}

pub fn draw(f: &mut Frame, screen: &Screen) {
    match screen.state {
        ViewState::Listing(listing) => list::draw(f, listing, screen),
        ViewState::Detail(detail) => view::draw(f, detail, screen),
        ViewState::Composing(editor) => compose::draw(f, editor, screen),
    }
}

fn status_line(screen: &Screen, help: &str) -> Paragraph<'static> {
    let text = screen.notice.map(Notice::text).unwrap_or_default();
    let style = match screen.notice {
        Some(Notice::Error(_)) => Style::default().fg(Color::Red),
        _ => Style::default(),
    };
    let spinner = if screen.loading { "… " } else { "" };
    Paragraph::new(format!("{spinner}{text}   {help}"))
        .style(style)
        .wrap(Wrap { trim: true })
}
