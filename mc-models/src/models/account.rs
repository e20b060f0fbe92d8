//! Demo account model.

use serde::{Deserialize, Serialize};

use crate::ids::CoId;

/// An account known to the sync provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: CoId,
    pub username: String,
}

impl Account {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: CoId::new(),
            username: username.into(),
        }
    }
}
