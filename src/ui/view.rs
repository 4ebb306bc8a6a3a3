use ratatui::{
    Frame,
    layout::{Layout, Direction, Constraint},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::controller::Detail;
use crate::render::Action;
use super::{status_line, Screen};

fn key_for(action: Action) -> char {
    match action {
        Action::Reply => 'r',
        Action::Archive | Action::Unarchive => 'e',
    }
}

pub fn draw(f: &mut Frame, detail: &Detail, screen: &Screen) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(f.size());

    let h = &detail.view.header;
    let header_text = format!(
        "From      {}\nTo        {}\nSubject   {}\nTimestamp {}",
        if h.from.is_empty() { "(unknown)" } else { &h.from },
        h.to,
        if h.subject.is_empty() { "(no subject)" } else { &h.subject },
        h.timestamp,
    );

    let header = Paragraph::new(header_text)
        .block(Block::default().borders(Borders::ALL).title("Mail"));

    let actions = detail
        .view
        .actions
        .iter()
        .map(|a| format!("[{}] {}", key_for(*a), a.label()))
        .collect::<Vec<_>>()
        .join("  ");

    let body = Paragraph::new(detail.view.body.clone())
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: false })
        .scroll((detail.scroll, 0));

    f.render_widget(header, chunks[0]);
    f.render_widget(Paragraph::new(actions), chunks[1]);
    f.render_widget(body, chunks[2]);

    let help = status_line(screen, "j/k scroll · Esc back · c compose · i/s/a mailboxes · q quit");
    f.render_widget(help, chunks[3]);
}
