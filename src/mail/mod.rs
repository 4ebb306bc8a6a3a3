pub mod error;
pub mod http;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

pub use error::MailError;

pub type MessageId = u64;

/// A message record as the store returns it.
///
/// Listings only carry the summary fields, so everything the list endpoint
/// omits falls back to its default.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: String,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mailbox {
    Inbox,
    Sent,
    Archive,
}

impl Mailbox {
    pub fn as_str(self) -> &'static str {
        match self {
            Mailbox::Inbox => "inbox",
            Mailbox::Sent => "sent",
            Mailbox::Archive => "archive",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Mailbox::Inbox => "Inbox",
            Mailbox::Sent => "Sent",
            Mailbox::Archive => "Archive",
        }
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a create request. `recipients` is sent as typed; the store splits
/// and validates it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    pub recipients: String,
    pub subject: String,
    pub body: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FlagUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

impl FlagUpdate {
    pub fn read() -> Self {
        Self { read: Some(true), archived: None }
    }

    pub fn archived(archived: bool) -> Self {
        Self { read: None, archived: Some(archived) }
    }
}

/// The four operations of the remote email store.
///
/// Calls are independent: nothing orders two calls issued separately, and a
/// failed call is never retried.
pub trait MailService: Send + Sync + 'static {
    fn list_mailbox(
        &self,
        mailbox: Mailbox,
    ) -> impl Future<Output = Result<Vec<Message>, MailError>> + Send;

    fn get_message(&self, id: MessageId) -> impl Future<Output = Result<Message, MailError>> + Send;

    /// Returns the store's acknowledgment text.
    fn create_message(
        &self,
        message: OutgoingMessage,
    ) -> impl Future<Output = Result<String, MailError>> + Send;

    fn update_message(
        &self,
        id: MessageId,
        flags: FlagUpdate,
    ) -> impl Future<Output = Result<(), MailError>> + Send;
}
