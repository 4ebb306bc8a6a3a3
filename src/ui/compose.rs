use ratatui::{
    Frame,
    layout::{Layout, Direction, Constraint},
    widgets::{Block, Borders, Paragraph, Wrap},
    style::{Style, Modifier},
};

use crate::draft::{ComposeField, Editor};
use super::{status_line, Screen};

const CURSOR: char = '▏';

/// The field's text, with a cursor marker when it has focus.
fn field_text(editor: &Editor, field: ComposeField) -> String {
    let mut text = editor.field(field).to_string();
    if editor.focus == field {
        text.insert(editor.cursor.min(text.len()), CURSOR);
    }
    text
}

fn focus_style(editor: &Editor, field: ComposeField) -> Style {
    if editor.focus == field {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

pub fn draw(f: &mut Frame, editor: &Editor, screen: &Screen) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(f.size());

    let to = Paragraph::new(field_text(editor, ComposeField::Recipients))
        .block(Block::default().borders(Borders::ALL).title("To"))
        .style(focus_style(editor, ComposeField::Recipients));
    f.render_widget(to, chunks[0]);

    let subject = Paragraph::new(field_text(editor, ComposeField::Subject))
        .block(Block::default().borders(Borders::ALL).title("Subject"))
        .style(focus_style(editor, ComposeField::Subject));
    f.render_widget(subject, chunks[1]);

    let body = Paragraph::new(field_text(editor, ComposeField::Body))
        .block(Block::default().borders(Borders::ALL).title("Body"))
        .wrap(Wrap { trim: false })
        .style(focus_style(editor, ComposeField::Body));
    f.render_widget(body, chunks[2]);

    let status = status_line(screen, "Tab switch field · Ctrl+S send · Esc cancel");
    f.render_widget(status, chunks[3]);
}
