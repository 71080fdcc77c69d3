// src/roster.rs

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::party::{Party, PeerId};
use crate::performer::{LocalHandle, LocalPerformer, Performer, RemoteHandle, RemotePerformer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    /// The party has no entry for our own peer id.
    NoLocalMember(PeerId),
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterError::NoLocalMember(id) => {
                write!(f, "no local member in roster (expected peer {id})")
            }
        }
    }
}

impl std::error::Error for RosterError {}

/// Per-track performers built from the party.
pub struct Roster {
    pub local: LocalHandle,
    pub remotes: BTreeMap<PeerId, RemoteHandle>,
    /// Every performer in PeerId order, for engine registration.
    order: Vec<(PeerId, Performer)>,
}

impl Roster {
    pub fn remote(&self, peer: &PeerId) -> Option<&RemoteHandle> {
        self.remotes.get(peer)
    }

    pub fn performers(&self) -> impl Iterator<Item = (&PeerId, &Performer)> {
        self.order.iter().map(|(id, p)| (id, p))
    }
}

/// Partitions the party into one local and N remote performers.
///
/// Walks members in PeerId order so every peer builds the same split on its
/// own. Nothing is registered anywhere; the caller hands the performers to
/// the engine.
pub fn build_performers(party: &Party) -> Result<Roster, RosterError> {
    if party.local_member().is_none() {
        return Err(RosterError::NoLocalMember(party.local_id().clone()));
    }

    let mut local = None;
    let mut remotes = BTreeMap::new();
    let mut order = Vec::with_capacity(party.len());

    for (peer, member) in party.iter() {
        if party.is_local(peer) {
            let handle: LocalHandle = Arc::new(Mutex::new(LocalPerformer::new(
                member.nick.clone(),
                member.colour.clone(),
                member.part,
            )));
            order.push((peer.clone(), Performer::Local(handle.clone())));
            local = Some(handle);
            continue;
        }

        let handle: RemoteHandle = Arc::new(Mutex::new(RemotePerformer::new(
            member.nick.clone(),
            member.colour.clone(),
            member.part,
        )));
        order.push((peer.clone(), Performer::Remote(handle.clone())));
        remotes.insert(peer.clone(), handle);
    }

    let local = local.ok_or_else(|| RosterError::NoLocalMember(party.local_id().clone()))?;

    Ok(Roster {
        local,
        remotes,
        order,
    })
}
