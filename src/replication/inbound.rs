// src/replication/inbound.rs

use log::trace;

use crate::party::PeerId;
use crate::performer::NoteEvent;
use crate::roster::Roster;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundOutcome {
    Applied { appended: usize },
    /// Sender has no remote performer for this track. Expected, not an error.
    UnknownSender,
}

/// Applies a `performanceUpdate` from `from` to its mirror in `roster`.
///
/// Messages from different senders touch different performers, so arrival
/// order across peers doesn't matter. Per sender, the transport is trusted to
/// deliver in order; nothing here re-sorts.
pub fn apply_inbound(
    roster: Option<&Roster>,
    from: &PeerId,
    notes: &[NoteEvent],
    score: f64,
) -> InboundOutcome {
    let Some(handle) = roster.and_then(|r| r.remote(from)) else {
        trace!("dropping performance update from {from}: no remote performer");
        return InboundOutcome::UnknownSender;
    };

    let appended = match handle.lock() {
        Ok(mut performer) => performer.apply_update(notes, score),
        Err(poisoned) => poisoned.into_inner().apply_update(notes, score),
    };
    trace!("applied {appended} notes from {from} (score {score})");
    InboundOutcome::Applied { appended }
}
