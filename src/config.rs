// src/config.rs

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::Viewport;

pub const DEFAULT_TICK_MS: u64 = 66;
pub const DEFAULT_TRACK_URL: &str = "https://music.ponytone.online/{track}/notes.txt";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Replication tick period. ~15 Hz balances latency against traffic.
    pub tick_interval_ms: u64,
    /// `{track}` is replaced with the selected track id.
    pub track_url_template: String,
    /// Size used for the first engine, until the UI reports a resize.
    pub viewport: Viewport,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_MS,
            track_url_template: DEFAULT_TRACK_URL.to_string(),
            viewport: Viewport::default(),
        }
    }
}

impl SessionConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn track_url(&self, track: &str) -> String {
        self.track_url_template.replace("{track}", track)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            bail!("tick_interval_ms must be > 0");
        }
        if !self.track_url_template.contains("{track}") {
            bail!("track_url_template has no {{track}} placeholder");
        }
        Ok(())
    }

    pub fn save_to_disk(&self, path: &str) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load_from_disk(path: &str) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening config {path}"))?;
        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `.env` (if any), then `PARTY_CONFIG` for a JSON file, then the
    /// single-value overrides.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = match std::env::var("PARTY_CONFIG") {
            Ok(path) => Self::load_from_disk(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// `PARTY_TICK_MS`, `PARTY_TRACK_URL`, `PARTY_VIEWPORT` (`WIDTHxHEIGHT`).
    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(ms) = get("PARTY_TICK_MS") {
            self.tick_interval_ms = ms
                .trim()
                .parse()
                .with_context(|| format!("bad PARTY_TICK_MS {ms:?}"))?;
        }
        if let Some(url) = get("PARTY_TRACK_URL") {
            self.track_url_template = url;
        }
        if let Some(size) = get("PARTY_VIEWPORT") {
            self.viewport = parse_viewport(&size)?;
        }
        self.validate()
    }
}

fn parse_viewport(s: &str) -> Result<Viewport> {
    let (w, h) = s
        .trim()
        .split_once('x')
        .with_context(|| format!("bad PARTY_VIEWPORT {s:?}, expected WIDTHxHEIGHT"))?;
    Ok(Viewport {
        width: w.parse().context("viewport width")?,
        height: h.parse().context("viewport height")?,
    })
}
