// src/party/playlist.rs

/// The shared track queue, as last announced by the party.
/// Only kept for display: the membership service decides what plays next.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Playlist {
    tracks: Vec<String>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue wholesale. Returns false when nothing changed so the
    /// caller can skip redrawing.
    pub fn replace(&mut self, tracks: Vec<String>) -> bool {
        if self.tracks == tracks {
            return false;
        }
        self.tracks = tracks;
        true
    }

    pub fn tracks(&self) -> &[String] {
        &self.tracks
    }

    pub fn next_up(&self) -> Option<&str> {
        self.tracks.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
