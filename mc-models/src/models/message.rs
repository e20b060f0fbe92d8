//! Message entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CoId, CoRef};

/// A single chat message.
///
/// The text is the only content field. Edits after creation go through the
/// sync provider; nothing here validates length or content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: CoId,
    pub text: String,
    /// Account id of the sender, when known.
    #[serde(default)]
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a message with a fresh id.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: CoId::new(),
            text: text.into(),
            author: None,
            created_at: Utc::now(),
        }
    }

    /// Attach the sending account.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// A typed reference to this message.
    pub fn co_ref(&self) -> CoRef<Message> {
        CoRef::new(self.id.clone())
    }
}
