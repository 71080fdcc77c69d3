// src/session/active.rs

use std::sync::PoisonError;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::mpsc::UnboundedSender;

use crate::engine::{GameEngine, SessionId};
use crate::network::PartyNetwork;
use crate::replication::OutboundReplicator;
use crate::roster::Roster;
use crate::session::ticker::ReplicationTicker;
use crate::session::ControllerEvent;

/// Everything that lives from Loading to Finished for one track: the engine,
/// the performers, the local cursor and the tick timer. Dropped as a unit.
pub struct ActiveSession<E: GameEngine> {
    id: SessionId,
    track: String,
    engine: E,
    roster: Option<Roster>,
    outbound: OutboundReplicator,
    ticker: Option<ReplicationTicker>,
}

impl<E: GameEngine> ActiveSession<E> {
    pub fn new(id: SessionId, track: String, engine: E) -> Self {
        Self {
            id,
            track,
            engine,
            roster: None,
            outbound: OutboundReplicator::new(),
            ticker: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn track(&self) -> &str {
        &self.track
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn roster(&self) -> Option<&Roster> {
        self.roster.as_ref()
    }

    /// The engine said Ready and performers are attached.
    pub fn is_engine_ready(&self) -> bool {
        self.roster.is_some()
    }

    pub fn outbound(&self) -> &OutboundReplicator {
        &self.outbound
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    /// Registers every performer with the engine, in roster order.
    pub fn attach_roster(&mut self, roster: Roster) {
        for (peer, performer) in roster.performers() {
            debug!("attaching {} performer for {peer}", if performer.is_local() { "local" } else { "remote" });
            self.engine.add_player(performer.clone());
        }
        self.roster = Some(roster);
    }

    pub fn start(
        &mut self,
        period: Duration,
        events: UnboundedSender<ControllerEvent>,
    ) -> anyhow::Result<()> {
        self.engine.start()?;
        self.ticker = Some(ReplicationTicker::spawn(self.id, period, events));
        Ok(())
    }

    /// One replication tick. Returns true if something was sent.
    pub fn transmit(&mut self, network: &mut impl PartyNetwork) -> bool {
        let Some(roster) = &self.roster else {
            return false;
        };
        let pending = {
            let local = roster.local.lock().unwrap_or_else(PoisonError::into_inner);
            self.outbound.pending(&local)
        };
        let Some(update) = pending else {
            return false;
        };

        match network.broadcast(&update.message) {
            Ok(()) => {
                self.outbound.commit(&update);
                true
            }
            Err(e) => {
                // cursor stays put; next tick resends
                warn!("performance broadcast failed: {e:#}");
                false
            }
        }
    }

    pub fn local_score(&self) -> Option<f64> {
        let roster = self.roster.as_ref()?;
        let local = roster.local.lock().unwrap_or_else(PoisonError::into_inner);
        Some(local.score)
    }

    /// Stops the timer, resets the cursor and cleans up the engine. Consumes
    /// the session so no performer outlives the track.
    pub fn close(mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
        self.outbound.reset();
        self.engine.cleanup();
    }
}
