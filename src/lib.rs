// src/lib.rs

pub mod config;
pub mod party;
pub mod performer;
pub mod roster;
pub mod barrier;
pub mod replication;
pub mod engine;
pub mod network;
pub mod session;
pub mod view;

pub use config::SessionConfig;
pub use party::{Party, PartyMember, PeerId, Playlist};
pub use roster::{build_performers, Roster, RosterError};
pub use barrier::LoadingBarrier;
pub use session::{event_queue, ControllerEvent, GameController, SessionState};
