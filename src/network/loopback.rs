// src/network/loopback.rs

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use tokio::sync::mpsc::UnboundedSender;

use crate::network::{PartyEvent, PartyNetwork};
use crate::party::{Party, PartyMember, PeerId};
use crate::replication::WireMessage;
use crate::session::ControllerEvent;

struct HubPeer {
    member: PartyMember,
    ready: bool,
    events: UnboundedSender<ControllerEvent>,
}

#[derive(Default)]
struct HubState {
    peers: BTreeMap<PeerId, HubPeer>,
    playlist: VecDeque<String>,
    current_track: Option<String>,
    ended: BTreeSet<PeerId>,
}

impl HubState {
    fn members(&self) -> BTreeMap<PeerId, PartyMember> {
        self.peers
            .iter()
            .map(|(id, p)| (id.clone(), p.member.clone()))
            .collect()
    }

    fn send_to_all(&self, make: impl Fn(&PeerId) -> ControllerEvent) {
        for (id, peer) in &self.peers {
            if peer.events.send(make(id)).is_err() {
                debug!("peer {id} queue closed");
            }
        }
    }

    /// Everyone gets the same members, each from their own point of view.
    fn publish_roster(&self) {
        let members = self.members();
        self.send_to_all(|id| {
            ControllerEvent::Party(PartyEvent::RosterChanged(Party::with_members(
                id.clone(),
                members.clone(),
            )))
        });
    }

    fn publish_playlist(&self) {
        let tracks: Vec<String> = self.playlist.iter().cloned().collect();
        self.send_to_all(|_| ControllerEvent::Party(PartyEvent::PlaylistChanged(tracks.clone())));
    }

    /// Records that `peer` is out of the current track, and closes the track
    /// once nobody is left in it.
    fn end_track_for(&mut self, peer: &PeerId) {
        if self.peers.contains_key(peer) {
            self.ended.insert(peer.clone());
        }
        self.close_track_if_done();
    }

    fn close_track_if_done(&mut self) {
        if self.current_track.is_none() {
            return;
        }
        if !self.peers.keys().all(|id| self.ended.contains(id)) {
            return;
        }
        if let Some(track) = self.current_track.take() {
            info!("🏁 {track} finished for the whole party");
        }
        for peer in self.peers.values_mut() {
            peer.member.loaded = false;
        }
    }

    /// Starts the next track once every peer voted ready.
    fn maybe_select_track(&mut self) {
        if self.current_track.is_some() || self.peers.is_empty() {
            return;
        }
        if !self.peers.values().all(|p| p.ready) {
            return;
        }
        let Some(track) = self.playlist.pop_front() else {
            return;
        };

        info!("🎶 party selected {track}");
        for peer in self.peers.values_mut() {
            peer.member.loaded = false;
        }
        self.ended.clear();
        self.current_track = Some(track.clone());

        self.publish_roster();
        self.publish_playlist();
        self.send_to_all(|_| ControllerEvent::Party(PartyEvent::TrackSelected(track.clone())));
    }
}

/// In-process stand-in for the membership service and transport: keeps the
/// party, collects ready votes, owns the playlist and fans messages out.
#[derive(Clone, Default)]
pub struct LoopbackHub {
    state: Arc<Mutex<HubState>>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn join(
        &self,
        peer: PeerId,
        member: PartyMember,
        events: UnboundedSender<ControllerEvent>,
    ) -> LoopbackNetwork {
        let mut state = self.lock();
        info!("👋 {} joined as {peer}", member.nick);
        state.peers.insert(
            peer.clone(),
            HubPeer {
                member,
                ready: false,
                events,
            },
        );
        state.publish_roster();
        state.publish_playlist();

        LoopbackNetwork {
            peer,
            hub: self.clone(),
        }
    }

    pub fn leave(&self, peer: &PeerId) {
        let mut state = self.lock();
        if let Some(gone) = state.peers.remove(peer) {
            info!("{} left", gone.member.nick);
            if gone.events.send(ControllerEvent::Party(PartyEvent::Disconnected)).is_err() {
                debug!("peer {peer} queue closed before disconnect");
            }
        }
        state.ended.remove(peer);
        state.close_track_if_done();
        state.publish_roster();
        state.maybe_select_track();
    }

    pub fn members(&self) -> BTreeMap<PeerId, PartyMember> {
        self.lock().members()
    }
}

/// One peer's connection to the hub.
pub struct LoopbackNetwork {
    peer: PeerId,
    hub: LoopbackHub,
}

impl LoopbackNetwork {
    pub fn peer_id(&self) -> &PeerId {
        &self.peer
    }
}

impl PartyNetwork for LoopbackNetwork {
    fn broadcast(&mut self, message: &WireMessage) -> anyhow::Result<()> {
        // Round-trip through JSON like a real transport would.
        let text = message.to_json()?;
        let state = self.hub.lock();
        for (id, peer) in &state.peers {
            if *id == self.peer {
                continue;
            }
            let decoded = WireMessage::from_json(&text)?;
            let event = ControllerEvent::Party(PartyEvent::Message {
                from: self.peer.clone(),
                message: decoded,
            });
            if peer.events.send(event).is_err() {
                debug!("peer {id} queue closed, message dropped");
            }
        }
        Ok(())
    }

    fn track_did_load(&mut self) {
        let mut state = self.hub.lock();
        if let Some(me) = state.peers.get_mut(&self.peer) {
            me.member.loaded = true;
        }
        state.send_to_all(|_| ControllerEvent::Party(PartyEvent::MemberLoaded(self.peer.clone())));
    }

    fn track_ended(&mut self, final_score: f64) {
        let mut state = self.hub.lock();
        if let Some(me) = state.peers.get_mut(&self.peer) {
            me.member.score = final_score;
            me.ready = false;
        }
        state.end_track_for(&self.peer);
        state.publish_roster();
        state.maybe_select_track();
    }

    fn track_aborted(&mut self) {
        let mut state = self.hub.lock();
        match state.peers.get_mut(&self.peer) {
            Some(me) => {
                warn!("{} dropped out of the current track", me.member.nick);
                me.member.loaded = false;
                me.ready = false;
            }
            None => {
                debug!("{} aborted after leaving", self.peer);
                return;
            }
        }
        state.end_track_for(&self.peer);
        state.publish_roster();
        state.maybe_select_track();
    }

    fn set_ready(&mut self, part: u8) {
        let mut state = self.hub.lock();
        match state.peers.get_mut(&self.peer) {
            Some(me) => {
                me.member.part = part;
                me.ready = true;
            }
            None => {
                warn!("ready vote from {} after leaving", self.peer);
                return;
            }
        }
        state.publish_roster();
        state.maybe_select_track();
    }

    fn add_to_playlist(&mut self, song: &str) {
        let mut state = self.hub.lock();
        state.playlist.push_back(song.to_string());
        state.publish_playlist();
        state.maybe_select_track();
    }
}
