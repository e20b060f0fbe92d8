//! Resolution of references into loaded values.

use std::collections::HashMap;

use crate::ids::CoId;
use crate::models::message::Message;

/// Looks up replicated messages by id.
///
/// A `None` answer means "not loaded yet", never "does not exist": the
/// sync provider owns existence and may deliver the value later.
pub trait Resolver {
    fn resolve(&self, id: &CoId) -> Option<Message>;
}

impl Resolver for HashMap<CoId, Message> {
    fn resolve(&self, id: &CoId) -> Option<Message> {
        self.get(id).cloned()
    }
}

impl<R: Resolver + ?Sized> Resolver for &R {
    fn resolve(&self, id: &CoId) -> Option<Message> {
        (**self).resolve(id)
    }
}

/// One entry of a chat as seen by a reader.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// The referenced message is available locally.
    Loaded(Message),
    /// The reference is valid but its value has not arrived yet.
    Pending(CoId),
}

impl Resolved {
    pub fn id(&self) -> &CoId {
        match self {
            Resolved::Loaded(message) => &message.id,
            Resolved::Pending(id) => id,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Resolved::Loaded(_))
    }

    pub fn as_loaded(&self) -> Option<&Message> {
        match self {
            Resolved::Loaded(message) => Some(message),
            Resolved::Pending(_) => None,
        }
    }

    pub fn into_loaded(self) -> Option<Message> {
        match self {
            Resolved::Loaded(message) => Some(message),
            Resolved::Pending(_) => None,
        }
    }
}
