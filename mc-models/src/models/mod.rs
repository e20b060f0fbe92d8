//! Entity models shared between the host bridge, sync provider and services.

pub mod account;
pub mod chat;
pub mod launch;
pub mod message;
