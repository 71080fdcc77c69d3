// src/view.rs

use log::{error, info};

use crate::engine::Viewport;
use crate::party::Party;

/// The UI widgets the controller drives: loading screen, party list, queue
/// and the ready indicator.
pub trait PartyView {
    fn show_loading(&mut self, visible: bool);

    /// Nicks still loading, already in roster order.
    fn set_loading_list(&mut self, pending: &[String]);

    fn update_playlist(&mut self, tracks: &[String]);

    fn update_party_list(&mut self, party: &Party);

    /// Clear the ready vote so the next track needs a fresh one.
    fn reset_ready(&mut self);

    fn show_error(&mut self, message: &str);
}

/// Input coming from the UI side.
#[derive(Clone, Debug, PartialEq)]
pub enum UiEvent {
    /// Ready vote, singing this part.
    Ready { part: u8 },
    SongPicked(String),
    Resize(Viewport),
}

/// A view that only writes to the log. Handy for headless peers.
#[derive(Debug, Default)]
pub struct LogView {
    pub label: String,
}

impl LogView {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

impl PartyView for LogView {
    fn show_loading(&mut self, visible: bool) {
        info!("[{}] loading screen {}", self.label, if visible { "shown" } else { "hidden" });
    }

    fn set_loading_list(&mut self, pending: &[String]) {
        if !pending.is_empty() {
            info!("[{}] waiting for: {}", self.label, pending.join(", "));
        }
    }

    fn update_playlist(&mut self, tracks: &[String]) {
        info!("[{}] queue: {:?}", self.label, tracks);
    }

    fn update_party_list(&mut self, party: &Party) {
        let names: Vec<&str> = party.iter().map(|(_, m)| m.nick.as_str()).collect();
        info!("[{}] party: {}", self.label, names.join(", "));
    }

    fn reset_ready(&mut self) {
        info!("[{}] ready reset", self.label);
    }

    fn show_error(&mut self, message: &str) {
        error!("[{}] {message}", self.label);
    }
}
