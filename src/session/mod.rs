// src/session/mod.rs

pub mod active;
pub mod ticker;

pub use active::ActiveSession;
pub use ticker::ReplicationTicker;

use log::{debug, error, info, trace, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::barrier::LoadingBarrier;
use crate::config::SessionConfig;
use crate::engine::{EngineEvent, EngineEvents, EngineFactory, GameEngine, SessionId, Viewport};
use crate::network::{PartyEvent, PartyNetwork};
use crate::party::{Party, PeerId, Playlist};
use crate::replication::{apply_inbound, WireMessage};
use crate::roster::build_performers;
use crate::view::{PartyView, UiEvent};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    Playing,
    Finished,
}

/// Everything the controller reacts to, from every collaborator.
#[derive(Clone, Debug, PartialEq)]
pub enum ControllerEvent {
    Party(PartyEvent),
    Engine { session: SessionId, event: EngineEvent },
    Ui(UiEvent),
    Tick { session: SessionId },
    Shutdown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Teardown {
    /// Natural end of track.
    Finished,
    /// Load failure, fatal roster error, disconnect, shutdown.
    Aborted,
}

pub fn event_queue() -> (UnboundedSender<ControllerEvent>, UnboundedReceiver<ControllerEvent>) {
    mpsc::unbounded_channel()
}

/// The session lifecycle state machine for one game window.
///
/// All state changes go through `handle_event`, one event at a time, so
/// nothing here needs locking.
pub struct GameController<F: EngineFactory, N: PartyNetwork, V: PartyView> {
    config: SessionConfig,
    factory: F,
    network: N,
    view: V,
    party: Party,
    playlist: Playlist,
    barrier: LoadingBarrier,
    state: SessionState,
    session: Option<ActiveSession<F::Engine>>,
    viewport: Viewport,
    next_session: u64,
    events: UnboundedSender<ControllerEvent>,
}

impl<F: EngineFactory, N: PartyNetwork, V: PartyView> GameController<F, N, V> {
    pub fn new(
        config: SessionConfig,
        local_id: PeerId,
        factory: F,
        network: N,
        view: V,
        events: UnboundedSender<ControllerEvent>,
    ) -> Self {
        let viewport = config.viewport;
        Self {
            config,
            factory,
            network,
            view,
            party: Party::new(local_id),
            playlist: Playlist::new(),
            barrier: LoadingBarrier::new(),
            state: SessionState::Idle,
            session: None,
            viewport,
            next_session: 0,
            events,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn party(&self) -> &Party {
        &self.party
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn barrier(&self) -> &LoadingBarrier {
        &self.barrier
    }

    pub fn session(&self) -> Option<&ActiveSession<F::Engine>> {
        self.session.as_ref()
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    /// Drains the queue until `Shutdown` or until every sender is gone.
    pub async fn run(mut self, mut rx: UnboundedReceiver<ControllerEvent>) -> Self {
        while let Some(event) = rx.recv().await {
            let shutdown = matches!(event, ControllerEvent::Shutdown);
            if let Err(e) = self.handle_event(event) {
                error!("❌ session error: {e:#}");
            }
            if shutdown {
                break;
            }
        }
        self.teardown(Teardown::Aborted);
        self
    }

    pub fn handle_event(&mut self, event: ControllerEvent) -> anyhow::Result<()> {
        match event {
            ControllerEvent::Party(event) => self.on_party_event(event),
            ControllerEvent::Engine { session, event } => {
                if self.session.as_ref().map(|s| s.id()) != Some(session) {
                    debug!("dropping {event:?} from stale session {session:?}");
                    return Ok(());
                }
                match event {
                    EngineEvent::Ready => self.on_engine_ready(),
                    EngineEvent::Finished => {
                        self.on_track_finished();
                        Ok(())
                    }
                    EngineEvent::LoadFailed(reason) => {
                        warn!("track failed to load: {reason}");
                        self.view.show_error(&format!("Track failed to load: {reason}"));
                        self.teardown(Teardown::Aborted);
                        Ok(())
                    }
                }
            }
            ControllerEvent::Ui(event) => {
                self.on_ui_event(event);
                Ok(())
            }
            ControllerEvent::Tick { session } => {
                self.on_tick(session);
                Ok(())
            }
            ControllerEvent::Shutdown => {
                info!("shutting down session controller");
                self.teardown(Teardown::Aborted);
                Ok(())
            }
        }
    }

    // --- PARTY / NETWORK ---

    fn on_party_event(&mut self, event: PartyEvent) -> anyhow::Result<()> {
        match event {
            PartyEvent::TrackSelected(track) => self.on_track_selected(track)?,
            PartyEvent::RosterChanged(party) => self.on_roster_changed(party),
            PartyEvent::MemberLoaded(peer) => self.on_member_loaded(&peer),
            PartyEvent::PlaylistChanged(tracks) => {
                if self.playlist.replace(tracks) {
                    self.view.update_playlist(self.playlist.tracks());
                }
            }
            PartyEvent::Message { from, message } => self.on_message(&from, message),
            PartyEvent::Disconnected => {
                warn!("disconnected from party");
                self.teardown(Teardown::Aborted);
            }
        }
        Ok(())
    }

    fn on_track_selected(&mut self, track: String) -> anyhow::Result<()> {
        if self.state != SessionState::Idle {
            warn!("ignoring selection of {track}: session is {:?}", self.state);
            return Ok(());
        }

        let id = SessionId(self.next_session);
        self.next_session += 1;
        let url = self.config.track_url(&track);
        info!("📀 loading {track} ({url}) as {id:?}");

        let events = EngineEvents::new(id, self.events.clone());
        let mut engine = match self.factory.create(self.viewport, &url, events) {
            Ok(engine) => engine,
            Err(e) => {
                self.view.show_error(&format!("Could not create game for {track}"));
                return Err(e.context(format!("creating engine for {track}")));
            }
        };
        if let Err(e) = engine.prepare() {
            engine.cleanup();
            self.view.show_error(&format!("Could not load {track}"));
            return Err(e.context(format!("preparing {track}")));
        }

        self.state = SessionState::Loading;
        self.session = Some(ActiveSession::new(id, track, engine));
        self.barrier.reset(&self.party);
        self.view.show_loading(true);
        self.refresh_loading_list();
        Ok(())
    }

    fn on_roster_changed(&mut self, party: Party) {
        if party.local_id() != self.party.local_id() {
            warn!(
                "roster for {} delivered to {}, ignoring",
                party.local_id(),
                self.party.local_id()
            );
            return;
        }
        self.party = party;
        for peer in self.barrier.loaded_peers() {
            self.party.mark_loaded(peer);
        }

        let local_ready = self.session.as_ref().is_some_and(|s| s.is_engine_ready());
        if local_ready {
            let local = self.party.local_id().clone();
            self.party.mark_loaded(&local);
        }

        self.view.update_party_list(&self.party);

        if self.state == SessionState::Loading {
            self.barrier.sync(&self.party, local_ready);
            self.refresh_loading_list();
            self.maybe_start();
        }
    }

    fn on_member_loaded(&mut self, peer: &PeerId) {
        if self.party.is_local(peer) {
            // ours is driven by the engine
            return;
        }
        if !self.party.mark_loaded(peer) {
            trace!("loaded flag for departed member {peer}");
        }
        if self.state != SessionState::Loading {
            return;
        }
        if !self.barrier.mark_loaded(peer) {
            trace!("{peer} isn't tracked by the loading barrier");
            return;
        }
        self.refresh_loading_list();
        self.maybe_start();
    }

    fn on_message(&mut self, from: &PeerId, message: WireMessage) {
        match message {
            WireMessage::PerformanceUpdate { notes, score } => {
                let roster = self.session.as_ref().and_then(|s| s.roster());
                apply_inbound(roster, from, &notes, score);
            }
            WireMessage::Other => trace!("ignoring unhandled message from {from}"),
        }
    }

    // --- ENGINE ---

    fn on_engine_ready(&mut self) -> anyhow::Result<()> {
        if self.state != SessionState::Loading {
            debug!("engine ready outside Loading ({:?})", self.state);
            return Ok(());
        }
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        if session.is_engine_ready() {
            debug!("duplicate engine ready for {:?}", session.id());
            return Ok(());
        }

        let roster = match build_performers(&self.party) {
            Ok(roster) => roster,
            Err(e) => {
                error!("cannot build roster for {}: {e}", session.track());
                self.view.show_error(&e.to_string());
                self.teardown(Teardown::Aborted);
                return Err(e.into());
            }
        };
        info!("🎙️ {} ready, {} remote performer(s)", session.track(), roster.remotes.len());
        session.attach_roster(roster);

        let local = self.party.local_id().clone();
        self.party.mark_loaded(&local);
        self.barrier.mark_loaded(&local);
        self.network.track_did_load();

        self.refresh_loading_list();
        self.maybe_start();
        Ok(())
    }

    /// Two-sided rendezvous: local engine ready and everyone else loaded.
    /// Whichever happens last gets us here with both true.
    fn maybe_start(&mut self) {
        if self.state != SessionState::Loading || !self.barrier.is_satisfied() {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.is_engine_ready() {
            return;
        }

        if let Err(e) = session.start(self.config.tick_interval(), self.events.clone()) {
            error!("failed to start {}: {e:#}", session.track());
            self.view.show_error("Could not start the track");
            self.teardown(Teardown::Aborted);
            return;
        }
        info!("▶️ {} playing", session.track());
        self.state = SessionState::Playing;
        self.view.show_loading(false);
    }

    fn on_tick(&mut self, session_id: SessionId) {
        if self.state != SessionState::Playing {
            trace!("tick outside Playing");
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.id() != session_id {
            trace!("stale tick for {session_id:?}");
            return;
        }
        session.transmit(&mut self.network);
    }

    fn on_track_finished(&mut self) {
        if self.state != SessionState::Playing {
            warn!("engine finished while {:?}", self.state);
            self.teardown(Teardown::Aborted);
            return;
        }
        self.state = SessionState::Finished;
        self.teardown(Teardown::Finished);
    }

    // --- UI ---

    fn on_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Ready { part } => {
                debug!("ready, singing part {part}");
                self.network.set_ready(part);
            }
            UiEvent::SongPicked(song) => {
                info!("adding {song} to the queue...");
                self.network.add_to_playlist(&song);
            }
            UiEvent::Resize(viewport) => {
                self.viewport = viewport;
                if let Some(session) = self.session.as_mut() {
                    session.engine_mut().set_size(viewport);
                }
            }
        }
    }

    // --- TEARDOWN ---

    fn refresh_loading_list(&mut self) {
        let pending = self.barrier.pending_nicks();
        self.view.set_loading_list(&pending);
    }

    /// The only way out of a session. Safe to call in any state.
    fn teardown(&mut self, how: Teardown) {
        let Some(mut session) = self.session.take() else {
            self.state = SessionState::Idle;
            return;
        };

        let final_score = if how == Teardown::Finished {
            // last notes could have landed after the previous tick
            session.transmit(&mut self.network);
            session.local_score()
        } else {
            None
        };

        info!("⏹️ tearing down {} ({how:?})", session.track());
        session.close();

        match final_score {
            Some(score) => {
                if let Some(me) = self.party.local_member_mut() {
                    me.score = score;
                }
                self.network.track_ended(score);
            }
            // the party must not wait on us for the rest of this track
            None => self.network.track_aborted(),
        }

        self.party.clear_loaded();
        self.barrier = LoadingBarrier::new();
        self.state = SessionState::Idle;

        self.view.show_loading(false);
        self.view.update_party_list(&self.party);
        self.view.reset_ready();
    }
}
