// src/replication/mod.rs

pub mod message;
pub mod outbound;
pub mod inbound;

pub use message::WireMessage;
pub use outbound::{OutboundReplicator, PendingUpdate};
pub use inbound::{apply_inbound, InboundOutcome};
