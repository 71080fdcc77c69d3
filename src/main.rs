// src/main.rs

use std::io::{stdout, Write};
use std::time::Duration;

use crossterm::{
    execute,
    style::{Print, Stylize},
};
use log::info;

use party_modules::engine::simulated::{SimulatedEngineFactory, SimulatedTrack};
use party_modules::network::loopback::LoopbackHub;
use party_modules::view::{LogView, PartyView, UiEvent};
use party_modules::{event_queue, ControllerEvent, GameController, Party, PartyMember, PeerId, SessionConfig};

const COLOURS: [&str; 6] = ["#e6194b", "#3cb44b", "#ffe119", "#4363d8", "#f58231", "#911eb4"];

/// Party view for the first peer, drawn straight to the terminal.
struct TerminalView {
    nick: String,
}

impl TerminalView {
    fn line(&self, text: String) {
        let _ = execute!(stdout(), Print(format!("{} {text}\n", format!("[{}]", self.nick).cyan())));
    }
}

impl PartyView for TerminalView {
    fn show_loading(&mut self, visible: bool) {
        if visible {
            self.line(format!("{}", "Loading track...".yellow().bold()));
        } else {
            self.line(format!("{}", "Go!".green().bold()));
        }
    }

    fn set_loading_list(&mut self, pending: &[String]) {
        if !pending.is_empty() {
            self.line(format!("waiting for {}", pending.join(", ").italic()));
        }
    }

    fn update_playlist(&mut self, tracks: &[String]) {
        self.line(format!("queue: {}", tracks.join(" → ")));
    }

    fn update_party_list(&mut self, party: &Party) {
        let names: Vec<String> = party
            .iter()
            .map(|(id, m)| {
                if party.is_local(id) {
                    format!("{} (you)", m.nick)
                } else {
                    m.nick.clone()
                }
            })
            .collect();
        self.line(format!("party: {}", names.join(", ")));
    }

    fn reset_ready(&mut self) {
        self.line("press ready for the next song".to_string());
    }

    fn show_error(&mut self, message: &str) {
        self.line(format!("{}", message.to_string().red()));
    }
}

/// Either view, so every controller has the same type.
enum PeerView {
    Terminal(TerminalView),
    Log(LogView),
}

impl PartyView for PeerView {
    fn show_loading(&mut self, visible: bool) {
        match self {
            PeerView::Terminal(v) => v.show_loading(visible),
            PeerView::Log(v) => v.show_loading(visible),
        }
    }

    fn set_loading_list(&mut self, pending: &[String]) {
        match self {
            PeerView::Terminal(v) => v.set_loading_list(pending),
            PeerView::Log(v) => v.set_loading_list(pending),
        }
    }

    fn update_playlist(&mut self, tracks: &[String]) {
        match self {
            PeerView::Terminal(v) => v.update_playlist(tracks),
            PeerView::Log(v) => v.update_playlist(tracks),
        }
    }

    fn update_party_list(&mut self, party: &Party) {
        match self {
            PeerView::Terminal(v) => v.update_party_list(party),
            PeerView::Log(v) => v.update_party_list(party),
        }
    }

    fn reset_ready(&mut self) {
        match self {
            PeerView::Terminal(v) => v.reset_ready(),
            PeerView::Log(v) => v.reset_ready(),
        }
    }

    fn show_error(&mut self, message: &str) {
        match self {
            PeerView::Terminal(v) => v.show_error(message),
            PeerView::Log(v) => v.show_error(message),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // party_sim [nick...]; defaults to three singers
    let mut nicks: Vec<String> = std::env::args().skip(1).collect();
    if nicks.is_empty() {
        nicks = vec!["alice".into(), "bob".into(), "carol".into()];
    }

    let config = SessionConfig::from_env()?;
    let track = SimulatedTrack::default();
    let song_length = Duration::from_millis(track.load_ms.1) + track.beat_period * track.beats as u32;

    let hub = LoopbackHub::new();
    let mut senders = Vec::new();
    let mut controllers = Vec::new();

    for (i, nick) in nicks.iter().enumerate() {
        let (tx, rx) = event_queue();
        let peer = PeerId::new(uuid::Uuid::new_v4().to_string());
        let member = PartyMember::new(nick.clone(), COLOURS[i % COLOURS.len()]);
        let network = hub.join(peer.clone(), member, tx.clone());

        let view = if i == 0 {
            PeerView::Terminal(TerminalView { nick: nick.clone() })
        } else {
            PeerView::Log(LogView::new(nick.clone()))
        };

        let ctl = GameController::new(
            config.clone(),
            peer,
            SimulatedEngineFactory::new(track.clone()),
            network,
            view,
            tx.clone(),
        );
        controllers.push(tokio::spawn(ctl.run(rx)));
        senders.push(tx);
    }

    // 1) Queue a song, 2) everyone votes ready
    senders[0].send(ControllerEvent::Ui(UiEvent::SongPicked("abba-dancing-queen".into())))?;
    for (i, tx) in senders.iter().enumerate() {
        tx.send(ControllerEvent::Ui(UiEvent::Ready { part: (i % 2) as u8 }))?;
    }

    // 3) Let the track play out, with a margin for the final flush
    tokio::time::sleep(song_length + Duration::from_millis(500)).await;

    for tx in &senders {
        let _ = tx.send(ControllerEvent::Shutdown);
    }
    let mut finished = Vec::new();
    for handle in controllers {
        finished.push(handle.await?);
    }

    // Every peer should agree on the final scores
    let mut out = stdout();
    writeln!(out, "\n{}", "🏆 Scoreboard".bold())?;
    if let Some(first) = finished.first() {
        let board = Party::with_members(first.party().local_id().clone(), hub.members());
        for (rank, (_, member)) in board.scoreboard().iter().enumerate() {
            writeln!(out, "  {}. {:<12} {:>6.0}", rank + 1, member.nick, member.score)?;
        }
    }
    info!("🛑 party over");
    Ok(())
}
