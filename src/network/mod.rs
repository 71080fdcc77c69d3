// src/network/mod.rs

pub mod loopback;

use crate::party::{Party, PeerId};
use crate::replication::WireMessage;

/// What this core needs from the peer transport / membership service.
pub trait PartyNetwork {
    /// Send to every other peer. The transport tags it with our peer id.
    fn broadcast(&mut self, message: &WireMessage) -> anyhow::Result<()>;

    /// Our engine finished loading the current track.
    fn track_did_load(&mut self);

    /// The current track ended here, with our final score.
    fn track_ended(&mut self, final_score: f64);

    /// We dropped out of the current track without finishing it (load or
    /// start failure, disconnect, shutdown). No score is reported.
    fn track_aborted(&mut self);

    /// Ready vote for the next track, singing `part`.
    fn set_ready(&mut self, part: u8);

    fn add_to_playlist(&mut self, song: &str);
}

/// Events the membership service delivers to the controller.
#[derive(Clone, Debug, PartialEq)]
pub enum PartyEvent {
    TrackSelected(String),
    /// Full replacement of the party snapshot.
    RosterChanged(Party),
    /// Shortcut for a single member's `loaded` flag flipping on.
    MemberLoaded(PeerId),
    PlaylistChanged(Vec<String>),
    Message { from: PeerId, message: WireMessage },
    Disconnected,
}
