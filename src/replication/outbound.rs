// src/replication/outbound.rs

use crate::performer::{Cursor, LocalPerformer};
use crate::replication::WireMessage;

/// An update ready to broadcast, plus the cursor position it commits to.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpdate {
    pub message: WireMessage,
    pub last_time: i64,
}

/// Local half of the replication protocol.
///
/// `pending` never moves the cursor; `commit` does, once the broadcast went
/// out. A failed send leaves the cursor where it was so the next tick resends
/// the same notes (plus anything new).
#[derive(Debug, Default)]
pub struct OutboundReplicator {
    cursor: Cursor,
}

impl OutboundReplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Everything sung since the last committed update, or `None` when there
    /// is nothing new (no empty messages go on the wire).
    pub fn pending(&self, local: &LocalPerformer) -> Option<PendingUpdate> {
        let notes = local.notes_in_range(self.cursor.time() + 1, None);
        let last_time = notes.last()?.time;
        Some(PendingUpdate {
            message: WireMessage::PerformanceUpdate {
                notes: notes.to_vec(),
                score: local.score,
            },
            last_time,
        })
    }

    pub fn commit(&mut self, update: &PendingUpdate) {
        self.cursor.advance(update.last_time);
    }

    pub fn reset(&mut self) {
        self.cursor.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::performer::NoteEvent;

    fn sent_times(update: &PendingUpdate) -> Vec<i64> {
        match &update.message {
            WireMessage::PerformanceUpdate { notes, .. } => notes.iter().map(|n| n.time).collect(),
            WireMessage::Other => vec![],
        }
    }

    #[test]
    fn ticks_send_disjoint_ranges() {
        let mut local = LocalPerformer::new("me".into(), "#fff".into(), 0);
        let mut out = OutboundReplicator::new();
        assert!(out.pending(&local).is_none());

        for t in 0..5 {
            local.record_note(NoteEvent::new(t));
        }
        local.score = 50.0;
        let first = out.pending(&local).unwrap();
        assert_eq!(sent_times(&first), [0, 1, 2, 3, 4]);
        out.commit(&first);
        assert_eq!(out.cursor().time(), 4);

        assert!(out.pending(&local).is_none());

        for t in 5..10 {
            local.record_note(NoteEvent::new(t));
        }
        let second = out.pending(&local).unwrap();
        assert_eq!(sent_times(&second), [5, 6, 7, 8, 9]);
        out.commit(&second);
        assert_eq!(out.cursor().time(), 9);
    }

    #[test]
    fn uncommitted_update_is_resent() {
        let mut local = LocalPerformer::new("me".into(), "#fff".into(), 0);
        let mut out = OutboundReplicator::new();
        local.record_note(NoteEvent::new(0));
        local.record_note(NoteEvent::new(1));

        let lost = out.pending(&local).unwrap();
        local.record_note(NoteEvent::new(2));
        let retry = out.pending(&local).unwrap();
        assert_eq!(sent_times(&lost), [0, 1]);
        assert_eq!(sent_times(&retry), [0, 1, 2]);

        out.commit(&retry);
        // a late commit of an older update can't pull the cursor back
        out.commit(&lost);
        assert_eq!(out.cursor().time(), 2);
    }

    #[test]
    fn message_carries_cumulative_score() {
        let mut local = LocalPerformer::new("me".into(), "#fff".into(), 0);
        local.record_note(NoteEvent::new(3));
        local.score = 812.0;
        let update = OutboundReplicator::new().pending(&local).unwrap();
        assert!(matches!(update.message, WireMessage::PerformanceUpdate { score, .. } if score == 812.0));
        assert_eq!(update.last_time, 3);
    }
}
