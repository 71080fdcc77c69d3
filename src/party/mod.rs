// src/party/mod.rs

pub mod playlist;

pub use playlist::Playlist;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Network-assigned identifier of a party member.
/// Ordering is lexicographic on the underlying string, which is what every
/// peer uses to build the same roster without exchanging an explicit order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartyMember {
    pub nick: String,
    pub colour: String,
    /// Which vocal part this member sings (0 = lead).
    pub part: u8,
    /// Finished loading the current track.
    pub loaded: bool,
    pub score: f64,
}

impl PartyMember {
    pub fn new(nick: impl Into<String>, colour: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            colour: colour.into(),
            part: 0,
            loaded: false,
            score: 0.0,
        }
    }
}

/// Snapshot of the party as seen by this instance.
///
/// The membership service owns the real state; the controller only keeps the
/// latest copy it was handed. Which entry belongs to us is stored once as
/// `local_id` instead of a flag on every member.
#[derive(Clone, Debug, PartialEq)]
pub struct Party {
    local_id: PeerId,
    members: BTreeMap<PeerId, PartyMember>,
}

impl Party {
    pub fn new(local_id: PeerId) -> Self {
        Self {
            local_id,
            members: BTreeMap::new(),
        }
    }

    pub fn with_members(local_id: PeerId, members: BTreeMap<PeerId, PartyMember>) -> Self {
        Self { local_id, members }
    }

    pub fn local_id(&self) -> &PeerId {
        &self.local_id
    }

    pub fn is_local(&self, peer: &PeerId) -> bool {
        *peer == self.local_id
    }

    pub fn local_member(&self) -> Option<&PartyMember> {
        self.members.get(&self.local_id)
    }

    pub fn local_member_mut(&mut self) -> Option<&mut PartyMember> {
        self.members.get_mut(&self.local_id)
    }

    pub fn insert(&mut self, peer: PeerId, member: PartyMember) {
        self.members.insert(peer, member);
    }

    pub fn remove(&mut self, peer: &PeerId) -> Option<PartyMember> {
        self.members.remove(peer)
    }

    pub fn get(&self, peer: &PeerId) -> Option<&PartyMember> {
        self.members.get(peer)
    }

    pub fn get_mut(&mut self, peer: &PeerId) -> Option<&mut PartyMember> {
        self.members.get_mut(peer)
    }

    /// Members in roster order (ascending PeerId).
    pub fn iter(&self) -> impl Iterator<Item = (&PeerId, &PartyMember)> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Sets `loaded` on a member. Returns false if the member is gone.
    pub fn mark_loaded(&mut self, peer: &PeerId) -> bool {
        match self.members.get_mut(peer) {
            Some(member) => {
                member.loaded = true;
                true
            }
            None => false,
        }
    }

    pub fn clear_loaded(&mut self) {
        for member in self.members.values_mut() {
            member.loaded = false;
        }
    }

    /// Members ordered by score, best first. Ties keep roster order.
    pub fn scoreboard(&self) -> Vec<(&PeerId, &PartyMember)> {
        let mut board: Vec<_> = self.members.iter().collect();
        board.sort_by(|a, b| b.1.score.total_cmp(&a.1.score));
        board
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn party() -> Party {
        let mut party = Party::new(PeerId::from("p2"));
        party.insert(PeerId::from("p3"), PartyMember::new("carol", "#00ff00"));
        party.insert(PeerId::from("p1"), PartyMember::new("alice", "#ff0000"));
        party.insert(PeerId::from("p2"), PartyMember::new("bob", "#0000ff"));
        party
    }

    #[test]
    fn iterates_in_peer_id_order() {
        let party = party();
        let ids: Vec<&str> = party.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["p1", "p2", "p3"]);
    }

    #[test]
    fn local_member_is_resolved_through_local_id() {
        let party = party();
        assert!(party.is_local(&PeerId::from("p2")));
        assert!(!party.is_local(&PeerId::from("p1")));
        assert_eq!(party.local_member().map(|m| m.nick.as_str()), Some("bob"));
    }

    #[test]
    fn mark_loaded_reports_missing_member() {
        let mut party = party();
        assert!(party.mark_loaded(&PeerId::from("p1")));
        assert!(!party.mark_loaded(&PeerId::from("gone")));
        assert!(party.get(&PeerId::from("p1")).is_some_and(|m| m.loaded));

        party.clear_loaded();
        assert!(party.iter().all(|(_, m)| !m.loaded));
    }

    #[test]
    fn scoreboard_orders_best_first() {
        let mut party = party();
        party.get_mut(&PeerId::from("p1")).unwrap().score = 10.0;
        party.get_mut(&PeerId::from("p3")).unwrap().score = 30.0;
        let order: Vec<&str> = party.scoreboard().iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(order, ["p3", "p1", "p2"]);
    }

    #[test]
    fn peer_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&PeerId::from("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }
}
