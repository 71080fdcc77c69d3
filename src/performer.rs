// src/performer.rs

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// One scored time unit of a performance.
/// `time` is the beat index; everything else is the engine's business and is
/// carried through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub time: i64,
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl NoteEvent {
    pub fn new(time: i64) -> Self {
        Self {
            time,
            payload: serde_json::Map::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }
}

/// High-water mark of note time for one singer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor(i64);

impl Cursor {
    /// Value before anything was sent/applied for the current track.
    pub const SENTINEL: i64 = -1;

    pub fn new() -> Self {
        Self(Self::SENTINEL)
    }

    pub fn time(&self) -> i64 {
        self.0
    }

    /// Moves forward only. Returns true if the mark moved.
    pub fn advance(&mut self, time: i64) -> bool {
        if time > self.0 {
            self.0 = time;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.0 = Self::SENTINEL;
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}

/// The singer at this instance. The engine appends notes as it scores live
/// input; the replicator reads them back by range.
#[derive(Debug)]
pub struct LocalPerformer {
    pub nick: String,
    pub colour: String,
    pub part: u8,
    pub score: f64,
    notes: Vec<NoteEvent>,
}

impl LocalPerformer {
    pub fn new(nick: String, colour: String, part: u8) -> Self {
        Self {
            nick,
            colour,
            part,
            score: 0.0,
            notes: Vec::new(),
        }
    }

    /// Append a scored note. Notes must arrive in strictly increasing time;
    /// anything else is dropped and reported as `false`.
    pub fn record_note(&mut self, note: NoteEvent) -> bool {
        if let Some(last) = self.notes.last() {
            if note.time <= last.time {
                return false;
            }
        }
        self.notes.push(note);
        true
    }

    /// Notes with `from <= time < to`; `to = None` means unbounded.
    pub fn notes_in_range(&self, from: i64, to: Option<i64>) -> &[NoteEvent] {
        let start = self.notes.partition_point(|n| n.time < from);
        let end = match to {
            Some(to) => self.notes.partition_point(|n| n.time < to),
            None => self.notes.len(),
        };
        if start >= end {
            return &[];
        }
        &self.notes[start..end]
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }
}

/// Mirror of another member's performance, fed by replication.
#[derive(Debug)]
pub struct RemotePerformer {
    pub nick: String,
    pub colour: String,
    pub part: u8,
    pub score: f64,
    notes: Vec<NoteEvent>,
    applied: Cursor,
}

impl RemotePerformer {
    pub fn new(nick: String, colour: String, part: u8) -> Self {
        Self {
            nick,
            colour,
            part,
            score: 0.0,
            notes: Vec::new(),
            applied: Cursor::new(),
        }
    }

    /// Applies one replicated update. Score is last-write-wins; notes at or
    /// below the applied cursor were already seen and are skipped. Returns
    /// how many notes were appended.
    pub fn apply_update(&mut self, notes: &[NoteEvent], score: f64) -> usize {
        self.score = score;
        let mut appended = 0;
        for note in notes {
            if note.time <= self.applied.time() {
                continue;
            }
            self.applied.advance(note.time);
            self.notes.push(note.clone());
            appended += 1;
        }
        appended
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    pub fn cursor(&self) -> Cursor {
        self.applied
    }
}

pub type LocalHandle = Arc<Mutex<LocalPerformer>>;
pub type RemoteHandle = Arc<Mutex<RemotePerformer>>;

/// What gets handed to the engine's `add_player`.
#[derive(Clone, Debug)]
pub enum Performer {
    Local(LocalHandle),
    Remote(RemoteHandle),
}

impl Performer {
    pub fn is_local(&self) -> bool {
        matches!(self, Performer::Local(_))
    }
}
