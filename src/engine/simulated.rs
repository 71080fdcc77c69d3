// src/engine/simulated.rs

use std::sync::PoisonError;
use std::time::Duration;

use log::{debug, info};
use rand::Rng;
use tokio::task::JoinHandle;

use crate::engine::{EngineEvents, EngineFactory, GameEngine, Viewport};
use crate::performer::{LocalHandle, NoteEvent, Performer};

/// Knobs for the fake engine.
#[derive(Clone, Debug)]
pub struct SimulatedTrack {
    /// Load time is picked uniformly from this range (ms).
    pub load_ms: (u64, u64),
    /// Time between sung beats.
    pub beat_period: Duration,
    /// Beats until the track ends by itself.
    pub beats: i64,
}

impl Default for SimulatedTrack {
    fn default() -> Self {
        Self {
            load_ms: (200, 1200),
            beat_period: Duration::from_millis(40),
            beats: 200,
        }
    }
}

pub struct SimulatedEngineFactory {
    pub track: SimulatedTrack,
}

impl SimulatedEngineFactory {
    pub fn new(track: SimulatedTrack) -> Self {
        Self { track }
    }
}

impl EngineFactory for SimulatedEngineFactory {
    type Engine = SimulatedEngine;

    fn create(
        &mut self,
        viewport: Viewport,
        track_url: &str,
        events: EngineEvents,
    ) -> anyhow::Result<SimulatedEngine> {
        debug!("creating simulated engine {}x{} for {track_url}", viewport.width, viewport.height);
        Ok(SimulatedEngine {
            track: self.track.clone(),
            track_url: track_url.to_string(),
            viewport,
            events,
            local: None,
            remotes: 0,
            tasks: Vec::new(),
        })
    }
}

/// Stands in for the real renderer: "loads" after a random delay, then sings
/// one note per beat with random pitch and accuracy.
pub struct SimulatedEngine {
    track: SimulatedTrack,
    track_url: String,
    viewport: Viewport,
    events: EngineEvents,
    local: Option<LocalHandle>,
    remotes: usize,
    tasks: Vec<JoinHandle<()>>,
}

impl SimulatedEngine {
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn remote_count(&self) -> usize {
        self.remotes
    }
}

impl GameEngine for SimulatedEngine {
    fn prepare(&mut self) -> anyhow::Result<()> {
        let (lo, hi) = self.track.load_ms;
        let delay = if hi > lo {
            rand::rng().random_range(lo..hi)
        } else {
            lo
        };
        let events = self.events.clone();
        let url = self.track_url.clone();
        self.tasks.push(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            debug!("simulated load of {url} done after {delay}ms");
            events.ready();
        }));
        Ok(())
    }

    fn start(&mut self) -> anyhow::Result<()> {
        let local = self
            .local
            .clone()
            .ok_or_else(|| anyhow::anyhow!("engine started without a local player"))?;
        let events = self.events.clone();
        let period = self.track.beat_period;
        let beats = self.track.beats;

        info!("🎤 {} singing {} beats ({} spectators)", self.track_url, beats, self.remotes);

        self.tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            for beat in 0..beats {
                interval.tick().await;

                // rng isn't Send; keep it out of the await
                let (pitch, accuracy) = {
                    let mut rng = rand::rng();
                    (rng.random_range(48..72_i64), rng.random_range(0.0..1.0_f64))
                };

                let mut performer = local.lock().unwrap_or_else(PoisonError::into_inner);
                let note = NoteEvent::new(beat)
                    .with_field("pitch", pitch)
                    .with_field("accuracy", accuracy);
                if performer.record_note(note) {
                    performer.score += (accuracy * 10.0).round();
                }
            }
            events.finished();
        }));
        Ok(())
    }

    fn cleanup(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.local = None;
        self.remotes = 0;
    }

    fn add_player(&mut self, performer: Performer) {
        match performer {
            Performer::Local(handle) => self.local = Some(handle),
            Performer::Remote(_) => self.remotes += 1,
        }
    }

    fn set_size(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }
}

impl Drop for SimulatedEngine {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineEvent, SessionId};
    use crate::performer::{LocalPerformer, RemotePerformer};
    use crate::session::ControllerEvent;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn loads_sings_and_finishes() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut factory = SimulatedEngineFactory::new(SimulatedTrack {
            load_ms: (100, 100),
            beat_period: Duration::from_millis(10),
            beats: 5,
        });
        let mut engine = factory
            .create(Viewport::default(), "song", EngineEvents::new(SessionId(7), tx))
            .unwrap();

        engine.prepare().unwrap();
        let ready = rx.recv().await.unwrap();
        assert!(matches!(
            ready,
            ControllerEvent::Engine { session: SessionId(7), event: EngineEvent::Ready }
        ));

        let local = Arc::new(Mutex::new(LocalPerformer::new("me".into(), "#fff".into(), 0)));
        let friend = Arc::new(Mutex::new(RemotePerformer::new("you".into(), "#000".into(), 1)));
        engine.add_player(Performer::Local(local.clone()));
        engine.add_player(Performer::Remote(friend));
        assert_eq!(engine.remote_count(), 1);

        let wide = Viewport { width: 1920, height: 1080 };
        engine.set_size(wide);
        assert_eq!(engine.viewport(), wide);
        engine.start().unwrap();

        let finished = rx.recv().await.unwrap();
        assert!(matches!(
            finished,
            ControllerEvent::Engine { event: EngineEvent::Finished, .. }
        ));
        let times: Vec<i64> = local.lock().unwrap().notes().iter().map(|n| n.time).collect();
        assert_eq!(times, [0, 1, 2, 3, 4]);
        engine.cleanup();
    }

    #[tokio::test]
    async fn start_without_local_player_fails() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut engine = SimulatedEngineFactory::new(SimulatedTrack::default())
            .create(Viewport::default(), "song", EngineEvents::new(SessionId(1), tx))
            .unwrap();
        assert!(engine.start().is_err());
    }
}
