// src/session/ticker.rs

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::engine::SessionId;
use crate::session::ControllerEvent;

/// Periodic replication timer. Runs as its own task and only enqueues
/// `Tick`s; the controller does the work when it pops them.
///
/// Aborted on `stop` and on drop, so a torn-down session can't leave a timer
/// behind.
#[derive(Debug)]
pub struct ReplicationTicker {
    handle: JoinHandle<()>,
}

impl ReplicationTicker {
    pub fn spawn(
        session: SessionId,
        period: Duration,
        events: UnboundedSender<ControllerEvent>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick fires immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                if events.send(ControllerEvent::Tick { session }).is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ReplicationTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
