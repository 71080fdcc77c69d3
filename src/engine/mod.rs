// src/engine/mod.rs

pub mod simulated;

use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::performer::Performer;
use crate::session::ControllerEvent;

/// Identifies one Loading..Finished span. Engine events and ticks carry it so
/// anything issued for an older session can be told apart and dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1280, height: 720 }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    /// Track assets are prepared; performers can be attached.
    Ready,
    /// The track played to its natural end.
    Finished,
    LoadFailed(String),
}

/// Handle an engine uses to report back to the controller.
#[derive(Clone, Debug)]
pub struct EngineEvents {
    session: SessionId,
    tx: UnboundedSender<ControllerEvent>,
}

impl EngineEvents {
    pub fn new(session: SessionId, tx: UnboundedSender<ControllerEvent>) -> Self {
        Self { session, tx }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn ready(&self) {
        self.send(EngineEvent::Ready);
    }

    pub fn finished(&self) {
        self.send(EngineEvent::Finished);
    }

    pub fn load_failed(&self, reason: impl Into<String>) {
        self.send(EngineEvent::LoadFailed(reason.into()));
    }

    fn send(&self, event: EngineEvent) {
        let msg = ControllerEvent::Engine {
            session: self.session,
            event,
        };
        if self.tx.send(msg).is_err() {
            debug!("controller queue closed, dropping engine event for {:?}", self.session);
        }
    }
}

/// The rendering/scoring engine for one track.
///
/// `prepare` only kicks off loading; completion arrives later as
/// `EngineEvent::Ready` through the `EngineEvents` handle given at creation.
pub trait GameEngine {
    fn prepare(&mut self) -> anyhow::Result<()>;
    fn start(&mut self) -> anyhow::Result<()>;
    fn cleanup(&mut self);
    fn add_player(&mut self, performer: Performer);
    fn set_size(&mut self, viewport: Viewport);
}

/// Builds a fresh engine per track. Engines are never reused.
pub trait EngineFactory {
    type Engine: GameEngine;

    fn create(
        &mut self,
        viewport: Viewport,
        track_url: &str,
        events: EngineEvents,
    ) -> anyhow::Result<Self::Engine>;
}
