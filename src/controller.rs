//! The view-state machine.
//!
//! Exactly one of three views is active at a time. Every trigger either
//! replaces the state immediately (compose, reply) or spawns a service call
//! whose [`Outcome`] comes back through a channel and is folded in by
//! [`Controller::apply`]. Each call is tagged with the generation it was
//! issued under; outcomes from an older generation are dropped, so the
//! latest trigger always wins no matter which response lands first.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::draft::{self, Editor};
use crate::mail::{FlagUpdate, MailError, MailService, Mailbox, Message, MessageId};
use crate::render::{self, Action, DetailView, SummaryRow};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Listing {
    pub mailbox: Mailbox,
    pub rows: Vec<SummaryRow>,
    pub selected: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Detail {
    pub message: Message,
    pub view: DetailView,
    pub scroll: u16,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewState {
    Listing(Listing),
    Detail(Detail),
    Composing(Editor),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Info(s) | Notice::Error(s) => s,
        }
    }
}

/// A finished service call, as delivered back to the UI loop.
#[derive(Debug)]
pub enum Outcome {
    Listed {
        generation: u64,
        mailbox: Mailbox,
        result: Result<Vec<Message>, MailError>,
    },
    Opened {
        generation: u64,
        result: Result<Message, MailError>,
    },
    MarkedRead {
        id: MessageId,
        result: Result<(), MailError>,
    },
    Sent {
        generation: u64,
        result: Result<String, MailError>,
    },
    Archived {
        generation: u64,
        id: MessageId,
        archived: bool,
        result: Result<(), MailError>,
    },
}

/// What the controller is waiting on. Reads can be superseded; writes block
/// every other trigger until they resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InFlight {
    Read,
    Sending,
    Archiving,
}

pub struct Controller<S> {
    service: Arc<S>,
    identity: String,
    state: ViewState,
    last_mailbox: Mailbox,
    generation: Arc<AtomicU64>,
    in_flight: Option<InFlight>,
    notice: Option<Notice>,
    tx: mpsc::UnboundedSender<Outcome>,
}

impl<S: MailService> Controller<S> {
    pub fn new(service: S, identity: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<Outcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let ctl = Self {
            service: Arc::new(service),
            identity: identity.into(),
            state: ViewState::Listing(Listing {
                mailbox: Mailbox::Inbox,
                rows: vec![],
                selected: 0,
            }),
            last_mailbox: Mailbox::Inbox,
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: None,
            notice: None,
            tx,
        };
        (ctl, rx)
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn notify(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// Loads the inbox into the initial listing.
    pub fn start(&mut self) {
        self.load_mailbox(Mailbox::Inbox);
    }

    fn next_generation(&mut self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn busy(&mut self) -> bool {
        match self.in_flight {
            Some(InFlight::Sending) => {
                self.notice = Some(Notice::Info("Still sending...".to_string()));
                true
            }
            Some(InFlight::Archiving) => {
                self.notice = Some(Notice::Info("Still updating...".to_string()));
                true
            }
            _ => false,
        }
    }

    fn fail(&mut self, what: &str, err: MailError) {
        warn!(kind = ?err.kind(), "{what}: {err}");
        self.notice = Some(Notice::Error(format!("{what}: {err}")));
    }

    pub fn select_mailbox(&mut self, mailbox: Mailbox) {
        if self.busy() {
            return;
        }
        self.load_mailbox(mailbox);
    }

    /// Reloads the mailbox currently shown.
    pub fn refresh(&mut self) {
        if let ViewState::Listing(listing) = &self.state {
            let mailbox = listing.mailbox;
            self.select_mailbox(mailbox);
        }
    }

    /// Leaves a detail or compose view for the last listed mailbox.
    pub fn back(&mut self) {
        if !matches!(self.state, ViewState::Listing(_)) {
            self.select_mailbox(self.last_mailbox);
        }
    }

    fn load_mailbox(&mut self, mailbox: Mailbox) {
        let generation = self.next_generation();
        self.in_flight = Some(InFlight::Read);
        self.notice = Some(Notice::Info(format!("Loading {}...", mailbox.title())));
        debug!(%mailbox, generation, "loading mailbox");

        let service = self.service.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = service.list_mailbox(mailbox).await;
            let _ = tx.send(Outcome::Listed { generation, mailbox, result });
        });
    }

    pub fn open_selected(&mut self) {
        if let ViewState::Listing(listing) = &self.state {
            if let Some(row) = listing.rows.get(listing.selected) {
                let id = row.id;
                self.open_message(id);
            }
        }
    }

    /// Fetches a message for the detail view, then marks it read without
    /// holding the render back for that second call.
    pub fn open_message(&mut self, id: MessageId) {
        if self.busy() || !matches!(self.state, ViewState::Listing(_)) {
            return;
        }

        let generation = self.next_generation();
        self.in_flight = Some(InFlight::Read);
        self.notice = Some(Notice::Info("Opening message...".to_string()));
        debug!(id, generation, "opening message");

        let service = self.service.clone();
        let tx = self.tx.clone();
        let current = self.generation.clone();
        tokio::spawn(async move {
            let result = service.get_message(id).await;
            let fetched = result.is_ok();
            let _ = tx.send(Outcome::Opened { generation, result });

            // A superseded open is dropped before it reaches the screen, so
            // the user never saw it. Every open that does get shown is still
            // marked read, whether or not it already was.
            if fetched && current.load(Ordering::SeqCst) == generation {
                let result = service.update_message(id, FlagUpdate::read()).await;
                let _ = tx.send(Outcome::MarkedRead { id, result });
            }
        });
    }

    pub fn compose(&mut self) {
        if self.busy() {
            return;
        }
        self.next_generation();
        self.in_flight = None;
        self.state = ViewState::Composing(Editor::new());
        self.notice = Some(Notice::Info("Compose".to_string()));
    }

    pub fn reply(&mut self) {
        if self.busy() {
            return;
        }
        let ViewState::Detail(detail) = &self.state else {
            return;
        };
        let draft = draft::reply_to(&detail.message);
        self.next_generation();
        self.in_flight = None;
        self.state = ViewState::Composing(Editor::reply(draft));
        self.notice = Some(Notice::Info("Reply".to_string()));
    }

    /// The compose form, unless a send is in flight.
    pub fn editor_mut(&mut self) -> Option<&mut Editor> {
        if self.in_flight == Some(InFlight::Sending) {
            return None;
        }
        match &mut self.state {
            ViewState::Composing(editor) => Some(editor),
            _ => None,
        }
    }

    /// Sends the draft. A second submit while the first is in flight is
    /// rejected.
    pub fn submit(&mut self) {
        if self.busy() {
            return;
        }
        let ViewState::Composing(editor) = &self.state else {
            return;
        };
        let outgoing = editor.draft.outgoing();

        let generation = self.next_generation();
        self.in_flight = Some(InFlight::Sending);
        self.notice = Some(Notice::Info("Sending...".to_string()));
        info!(recipients = %outgoing.recipients, "sending message");

        let service = self.service.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = service.create_message(outgoing).await;
            let _ = tx.send(Outcome::Sent { generation, result });
        });
    }

    /// Flips the archived flag of the shown message and waits for the store
    /// before heading back to the inbox.
    pub fn toggle_archive(&mut self) {
        if self.busy() {
            return;
        }
        let ViewState::Detail(detail) = &self.state else {
            return;
        };
        let archived = match detail.view.archive_action() {
            Some(Action::Archive) => true,
            Some(_) => false,
            None => {
                self.notice = Some(Notice::Info("Sent messages cannot be archived".to_string()));
                return;
            }
        };
        let id = detail.message.id;

        let generation = self.next_generation();
        self.in_flight = Some(InFlight::Archiving);
        let label = if archived { "Archiving..." } else { "Unarchiving..." };
        self.notice = Some(Notice::Info(label.to_string()));
        info!(id, archived, "updating archived flag");

        let service = self.service.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = service.update_message(id, FlagUpdate::archived(archived)).await;
            let _ = tx.send(Outcome::Archived { generation, id, archived, result });
        });
    }

    pub fn move_selection(&mut self, delta: isize) {
        if let ViewState::Listing(listing) = &mut self.state {
            if listing.rows.is_empty() {
                listing.selected = 0;
                return;
            }
            let last = listing.rows.len() - 1;
            listing.selected = listing.selected.saturating_add_signed(delta).min(last);
        }
    }

    pub fn scroll(&mut self, delta: i16) {
        if let ViewState::Detail(detail) = &mut self.state {
            detail.scroll = detail.scroll.saturating_add_signed(delta);
        }
    }

    pub fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Listed { generation, mailbox, result } => {
                if !self.is_current(generation) {
                    debug!(%mailbox, generation, "dropping stale listing");
                    return;
                }
                self.in_flight = None;
                match result {
                    Ok(messages) => {
                        info!(%mailbox, count = messages.len(), "mailbox loaded");
                        let rows = messages.iter().map(render::summary_row).collect::<Vec<_>>();
                        self.notice = Some(Notice::Info(format!(
                            "{} · {} messages",
                            mailbox.title(),
                            rows.len()
                        )));
                        self.state = ViewState::Listing(Listing { mailbox, rows, selected: 0 });
                        self.last_mailbox = mailbox;
                    }
                    Err(err) => self.fail(&format!("Could not load {}", mailbox.title()), err),
                }
            }
            Outcome::Opened { generation, result } => {
                if !self.is_current(generation) {
                    debug!(generation, "dropping stale message");
                    return;
                }
                self.in_flight = None;
                match result {
                    Ok(message) => {
                        info!(id = message.id, "message opened");
                        let own = render::is_own_message(&self.identity, &message);
                        let view = render::detail_view(&message, own);
                        self.notice = None;
                        self.state = ViewState::Detail(Detail { message, view, scroll: 0 });
                    }
                    Err(err) => self.fail("Could not open message", err),
                }
            }
            Outcome::MarkedRead { id, result } => {
                let Err(err) = result else {
                    return;
                };
                let showing = matches!(&self.state, ViewState::Detail(d) if d.message.id == id);
                if showing {
                    self.fail(&format!("Could not mark message {id} as read"), err);
                } else {
                    warn!(id, kind = ?err.kind(), "could not mark message as read: {err}");
                }
            }
            Outcome::Sent { generation, result } => {
                if !self.is_current(generation) {
                    debug!(generation, "dropping stale send result");
                    return;
                }
                self.in_flight = None;
                match result {
                    Ok(ack) => {
                        info!("message sent");
                        self.state = ViewState::Listing(Listing {
                            mailbox: Mailbox::Sent,
                            rows: vec![],
                            selected: 0,
                        });
                        self.load_mailbox(Mailbox::Sent);
                        self.notice = Some(Notice::Info(ack));
                    }
                    Err(err) => self.fail("Could not send message", err),
                }
            }
            Outcome::Archived { generation, id, archived, result } => {
                if !self.is_current(generation) {
                    debug!(id, generation, "dropping stale archive result");
                    return;
                }
                self.in_flight = None;
                match result {
                    Ok(()) => {
                        if let ViewState::Detail(detail) = &mut self.state {
                            if detail.message.id == id {
                                detail.message.archived = archived;
                                let own = render::is_own_message(&self.identity, &detail.message);
                                detail.view = render::detail_view(&detail.message, own);
                            }
                        }
                        self.load_mailbox(Mailbox::Inbox);
                    }
                    Err(err) => {
                        let what = if archived { "Could not archive message" } else { "Could not unarchive message" };
                        self.fail(what, err);
                    }
                }
            }
        }
    }
}
