use ratatui::{
    Frame,
    layout::{Layout, Direction, Constraint},
    widgets::{Block, Borders, List, ListItem, ListState},
    style::{Style, Modifier},
};

use crate::controller::Listing;
use super::{status_line, Screen};

pub fn draw(f: &mut Frame, listing: &Listing, screen: &Screen) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(2)])
        .split(f.size());

    let items = if listing.rows.is_empty() {
        let hint = if screen.loading { "Loading..." } else { "No messages (press o to refresh)" };
        vec![ListItem::new(hint)]
    } else {
        listing.rows.iter().map(|r| {
            let subject = if r.subject.is_empty() { "(no subject)" } else { r.subject.as_str() };
            let sender = if r.sender.is_empty() { "(unknown)" } else { r.sender.as_str() };
            let item = ListItem::new(format!("{sender}  {subject}\n  {}", r.timestamp));
            if r.dimmed {
                item.style(Style::default().add_modifier(Modifier::DIM))
            } else {
                item.style(Style::default().add_modifier(Modifier::BOLD))
            }
        }).collect::<Vec<_>>()
    };

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(listing.mailbox.title()))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("▶ ");

    let mut state = ListState::default();
    if !listing.rows.is_empty() {
        state.select(Some(listing.selected.min(listing.rows.len() - 1)));
    }

    f.render_stateful_widget(list, chunks[0], &mut state);

    let help = status_line(
        screen,
        "j/k move · Enter open · i/s/a inbox/sent/archive · o refresh · c compose · q quit",
    );
    f.render_widget(help, chunks[1]);
}
