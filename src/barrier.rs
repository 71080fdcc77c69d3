// src/barrier.rs

use std::collections::BTreeMap;

use crate::party::{Party, PeerId};

#[derive(Debug, Clone)]
struct Entry {
    nick: String,
    loaded: bool,
}

/// Who still has to finish loading the current track.
///
/// There is no timeout: a member that never loads holds everyone at the
/// loading screen until the host deals with them.
#[derive(Debug, Clone, Default)]
pub struct LoadingBarrier {
    members: BTreeMap<PeerId, Entry>,
}

impl LoadingBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a new track. The local member starts unloaded no matter
    /// what the party copy says; its flag belongs to the local engine.
    pub fn reset(&mut self, party: &Party) {
        self.members.clear();
        self.sync(party, false);
    }

    /// Re-read the party after a roster change. Members that left are dropped,
    /// new members are tracked with whatever flag the network reports. A flag
    /// already seen never goes back to false within a track: snapshots can
    /// trail the `MemberLoaded` shortcut.
    pub fn sync(&mut self, party: &Party, local_loaded: bool) {
        self.members.retain(|peer, _| party.get(peer).is_some());

        for (peer, member) in party.iter() {
            let loaded = if party.is_local(peer) {
                local_loaded
            } else {
                member.loaded
            };
            let entry = self.members.entry(peer.clone()).or_insert_with(|| Entry {
                nick: member.nick.clone(),
                loaded,
            });
            entry.nick.clone_from(&member.nick);
            entry.loaded |= loaded;
        }
    }

    /// Returns false if the peer isn't tracked (left, or never was).
    pub fn mark_loaded(&mut self, peer: &PeerId) -> bool {
        match self.members.get_mut(peer) {
            Some(entry) => {
                entry.loaded = true;
                true
            }
            None => false,
        }
    }

    /// Peers known to have loaded the current track.
    pub fn loaded_peers(&self) -> impl Iterator<Item = &PeerId> {
        self.members
            .iter()
            .filter(|(_, e)| e.loaded)
            .map(|(peer, _)| peer)
    }

    pub fn is_satisfied(&self) -> bool {
        self.members.values().all(|e| e.loaded)
    }

    /// Display names of members still loading, in roster order.
    pub fn pending_nicks(&self) -> Vec<String> {
        self.members
            .values()
            .filter(|e| !e.loaded)
            .map(|e| e.nick.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
