//! Turns message records into what the views draw. Nothing here touches the
//! network or the view state.

use crate::mail::{Message, MessageId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummaryRow {
    pub id: MessageId,
    pub sender: String,
    pub subject: String,
    pub timestamp: String,
    /// Read messages are drawn at reduced prominence.
    pub dimmed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub timestamp: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Reply,
    Archive,
    Unarchive,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Action::Reply => "Reply",
            Action::Archive => "Archive",
            Action::Unarchive => "Unarchive",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetailView {
    pub header: Header,
    pub actions: Vec<Action>,
    pub body: String,
}

impl DetailView {
    /// The archive control, if this message offers one.
    pub fn archive_action(&self) -> Option<Action> {
        self.actions
            .iter()
            .copied()
            .find(|a| matches!(a, Action::Archive | Action::Unarchive))
    }
}

pub fn summary_row(message: &Message) -> SummaryRow {
    SummaryRow {
        id: message.id,
        sender: message.sender.clone(),
        subject: message.subject.clone(),
        timestamp: message.timestamp.clone(),
        dimmed: message.read,
    }
}

pub fn is_own_message(identity: &str, message: &Message) -> bool {
    identity == message.sender
}

/// Own messages never get an archive control.
pub fn detail_view(message: &Message, is_own_message: bool) -> DetailView {
    let mut actions = vec![Action::Reply];
    if !is_own_message {
        actions.push(if message.archived { Action::Unarchive } else { Action::Archive });
    }

    DetailView {
        header: Header {
            from: message.sender.clone(),
            to: message.recipients.join(", "),
            subject: message.subject.clone(),
            timestamp: message.timestamp.clone(),
        },
        actions,
        body: message.body.clone(),
    }
}
