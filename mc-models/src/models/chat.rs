//! Chat entity model: an append-only, ordered log of message references.

use serde::{Deserialize, Serialize};

use crate::ids::{CoId, CoRef};
use crate::models::message::Message;
use crate::resolve::{Resolved, Resolver};

/// A chat log.
///
/// Insertion order is display order. The only mutation is [`Chat::append`];
/// entries are never removed or reordered at this layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: CoId,
    #[serde(default)]
    items: Vec<CoRef<Message>>,
}

impl Chat {
    /// Create an empty chat with a fresh id.
    pub fn new() -> Self {
        Self::with_id(CoId::new())
    }

    /// Create an empty chat with a known id.
    pub fn with_id(id: CoId) -> Self {
        Self { id, items: Vec::new() }
    }

    /// Append one message reference at the end of the log.
    pub fn append(&mut self, message: CoRef<Message>) {
        self.items.push(message);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The raw references, in insertion order.
    pub fn refs(&self) -> &[CoRef<Message>] {
        &self.items
    }

    /// Read the entry at `index`.
    pub fn get<R: Resolver + ?Sized>(&self, index: usize, resolver: &R) -> Option<Resolved> {
        self.items.get(index).map(|r| resolve_one(r, resolver))
    }

    /// Lazily resolve every entry in insertion order.
    ///
    /// The iterator is `Clone`, so a reader can restart from the top
    /// without touching the chat again.
    pub fn messages<'a, R: Resolver + ?Sized>(&'a self, resolver: &'a R) -> ChatMessages<'a, R> {
        ChatMessages {
            refs: self.items.iter(),
            resolver,
        }
    }

    /// Only the messages that are already loaded, in order.
    pub fn loaded_messages<R: Resolver + ?Sized>(&self, resolver: &R) -> Vec<Message> {
        self.messages(resolver).filter_map(Resolved::into_loaded).collect()
    }
}

impl Default for Chat {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_one<R: Resolver + ?Sized>(r: &CoRef<Message>, resolver: &R) -> Resolved {
    match resolver.resolve(r.id()) {
        Some(message) => Resolved::Loaded(message),
        None => Resolved::Pending(r.id().clone()),
    }
}

/// Iterator over a chat's entries, see [`Chat::messages`].
pub struct ChatMessages<'a, R: ?Sized> {
    refs: std::slice::Iter<'a, CoRef<Message>>,
    resolver: &'a R,
}

impl<R: ?Sized> Clone for ChatMessages<'_, R> {
    fn clone(&self) -> Self {
        Self {
            refs: self.refs.clone(),
            resolver: self.resolver,
        }
    }
}

impl<R: Resolver + ?Sized> Iterator for ChatMessages<'_, R> {
    type Item = Resolved;

    fn next(&mut self) -> Option<Self::Item> {
        self.refs.next().map(|r| resolve_one(r, self.resolver))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.refs.size_hint()
    }
}

impl<R: Resolver + ?Sized> ExactSizeIterator for ChatMessages<'_, R> {}
