use crate::mail::{Message, OutgoingMessage};

const REPLY_PREFIX: &str = "Re: ";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Draft {
    pub recipients: String,
    pub subject: String,
    pub body: String,
}

impl Draft {
    pub fn outgoing(&self) -> OutgoingMessage {
        OutgoingMessage {
            recipients: self.recipients.clone(),
            subject: self.subject.clone(),
            body: self.body.clone(),
        }
    }
}

pub fn reply_subject(subject: &str) -> String {
    if subject.is_empty() || subject.starts_with(REPLY_PREFIX) {
        subject.to_string()
    } else {
        format!("{REPLY_PREFIX}{subject}")
    }
}

/// Seeds a reply. The body leaves two empty lines for the reply author above
/// the quoted original.
pub fn reply_to(original: &Message) -> Draft {
    let body = if original.timestamp.is_empty() {
        String::new()
    } else {
        format!(
            "\n\nOn {} {} wrote:\n\n{}",
            original.timestamp, original.sender, original.body
        )
    };

    Draft {
        recipients: original.sender.clone(),
        subject: reply_subject(&original.subject),
        body,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComposeField {
    Recipients,
    Subject,
    Body,
}

impl ComposeField {
    fn next(self) -> Self {
        match self {
            ComposeField::Recipients => ComposeField::Subject,
            ComposeField::Subject => ComposeField::Body,
            ComposeField::Body => ComposeField::Recipients,
        }
    }

    fn prev(self) -> Self {
        match self {
            ComposeField::Recipients => ComposeField::Body,
            ComposeField::Subject => ComposeField::Recipients,
            ComposeField::Body => ComposeField::Subject,
        }
    }
}

/// The compose form: a draft plus where the user is typing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Editor {
    pub draft: Draft,
    pub focus: ComposeField,
    /// Byte offset into the focused field, always on a char boundary.
    pub cursor: usize,
}

impl Editor {
    pub fn new() -> Self {
        Self { draft: Draft::default(), focus: ComposeField::Recipients, cursor: 0 }
    }

    pub fn reply(draft: Draft) -> Self {
        Self { draft, focus: ComposeField::Body, cursor: 0 }
    }

    pub fn field(&self, field: ComposeField) -> &str {
        match field {
            ComposeField::Recipients => &self.draft.recipients,
            ComposeField::Subject => &self.draft.subject,
            ComposeField::Body => &self.draft.body,
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            ComposeField::Recipients => &mut self.draft.recipients,
            ComposeField::Subject => &mut self.draft.subject,
            ComposeField::Body => &mut self.draft.body,
        }
    }

    fn focus_on(&mut self, field: ComposeField) {
        self.focus = field;
        self.cursor = self.field(field).len();
    }

    pub fn next_field(&mut self) {
        self.focus_on(self.focus.next());
    }

    pub fn prev_field(&mut self) {
        self.focus_on(self.focus.prev());
    }

    pub fn insert(&mut self, ch: char) {
        let cursor = self.cursor;
        self.focused_mut().insert(cursor, ch);
        self.cursor += ch.len_utf8();
    }

    /// Newline in the body, next field elsewhere.
    pub fn enter(&mut self) {
        if self.focus == ComposeField::Body {
            self.insert('\n');
        } else {
            self.next_field();
        }
    }

    pub fn backspace(&mut self) {
        let cursor = self.cursor;
        let field = self.focused_mut();
        let prev = field[..cursor].char_indices().next_back().map(|(idx, _)| idx);
        if let Some(idx) = prev {
            field.remove(idx);
            self.cursor = idx;
        }
    }

    pub fn left(&mut self) {
        let prev = self.field(self.focus)[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(idx, _)| idx);
        if let Some(idx) = prev {
            self.cursor = idx;
        }
    }

    pub fn right(&mut self) {
        let next = self.field(self.focus)[self.cursor..].chars().next();
        if let Some(ch) = next {
            self.cursor += ch.len_utf8();
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn original(subject: &str) -> Message {
        Message {
            id: 9,
            sender: "ann@example.com".to_string(),
            recipients: vec!["me@example.com".to_string()],
            subject: subject.to_string(),
            body: "See you there.".to_string(),
            timestamp: "Jan 05 2024, 08:30 PM".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn reply_subject_is_prefixed_once() {
        assert_eq!(reply_to(&original("Hello")).subject, "Re: Hello");
        assert_eq!(reply_to(&original("Re: Hello")).subject, "Re: Hello");
        assert_eq!(reply_subject("re: Hello"), "Re: re: Hello");
        assert_eq!(reply_subject(""), "");
    }

    #[test]
    fn reply_quotes_original_below_empty_lines() {
        let draft = reply_to(&original("Hello"));
        assert_eq!(draft.recipients, "ann@example.com");
        assert_eq!(
            draft.body,
            "\n\nOn Jan 05 2024, 08:30 PM ann@example.com wrote:\n\nSee you there."
        );
    }

    #[test]
    fn reply_without_timestamp_has_empty_body() {
        let mut m = original("Hello");
        m.timestamp.clear();
        assert_eq!(reply_to(&m).body, "");
    }

    #[test]
    fn reply_editor_types_above_the_quote() {
        let mut editor = Editor::reply(reply_to(&original("Hello")));
        assert_eq!(editor.focus, ComposeField::Body);
        for ch in "Sure!".chars() {
            editor.insert(ch);
        }
        assert!(editor.draft.body.starts_with("Sure!\n\nOn Jan 05"));
    }

    #[test]
    fn editor_moves_between_fields() {
        let mut editor = Editor::new();
        editor.insert('x');
        editor.enter();
        assert_eq!(editor.focus, ComposeField::Subject);
        editor.insert('s');
        editor.enter();
        assert_eq!(editor.focus, ComposeField::Body);
        editor.insert('a');
        editor.enter();
        editor.insert('b');
        editor.next_field();
        assert_eq!(editor.focus, ComposeField::Recipients);
        editor.prev_field();
        assert_eq!(editor.focus, ComposeField::Body);
        assert_eq!(editor.cursor, editor.draft.body.len());

        assert_eq!(
            editor.draft.outgoing(),
            OutgoingMessage {
                recipients: "x".to_string(),
                subject: "s".to_string(),
                body: "a\nb".to_string(),
            }
        );
    }

    #[test]
    fn cursor_edits_respect_char_boundaries() {
        let mut editor = Editor::new();
        for ch in "héllo".chars() {
            editor.insert(ch);
        }
        editor.left();
        editor.left();
        editor.left();
        editor.backspace();
        assert_eq!(editor.draft.recipients, "hllo");
        editor.right();
        editor.insert('-');
        assert_eq!(editor.draft.recipients, "hl-lo");

        editor.cursor = 0;
        editor.backspace();
        editor.left();
        assert_eq!(editor.draft.recipients, "hl-lo");
        assert_eq!(editor.cursor, 0);
    }
}
