//! Score synthesis.
//!
//! Combines the heuristic score with the oracle's estimate. Oracle answers
//! arrive later than heuristic ones; until they do, the caller gets a
//! provisional value and re-rates when [`MeterEvent::Guess`] comes in.

use crate::config::Config;
use crate::heuristic::HeuristicResult;
use crate::meter::MeterEvent;
use crate::oracle::{GuessOracle, OracleMode, log_guess_number, meter_clamp, oracle_score};
use crate::text::char_len;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuessEstimate {
    /// Requested, no answer yet.
    InFlight,
    /// log10 of the corrected guess number. May be NaN or infinite.
    Resolved(f64),
}

/// Per-mode record of oracle requests and answers.
#[derive(Debug, Clone, Default)]
pub struct GuessCache {
    entries: HashMap<String, GuessEstimate>,
}

impl GuessCache {
    pub fn get(&self, password: &str) -> Option<GuessEstimate> {
        self.entries.get(password).copied()
    }

    /// The resolved log10 guess number, if the oracle has answered.
    pub fn log_guesses(&self, password: &str) -> Option<f64> {
        match self.get(password)? {
            GuessEstimate::Resolved(log) => Some(log),
            GuessEstimate::InFlight => None,
        }
    }

    /// Marks `password` as requested. `false` if it already was.
    pub(crate) fn begin(&mut self, password: &str) -> bool {
        if self.entries.contains_key(password) {
            return false;
        }
        self.entries
            .insert(password.to_string(), GuessEstimate::InFlight);
        true
    }

    pub(crate) fn resolve(&mut self, password: &str, log_guesses: f64) {
        self.entries
            .insert(password.to_string(), GuessEstimate::Resolved(log_guesses));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A meter value and whether anything may still change it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreEstimate {
    Settled(f64),
    /// Shown while the oracle is still working.
    Provisional(f64),
}

impl ScoreEstimate {
    pub fn value(self) -> f64 {
        match self {
            Self::Settled(v) | Self::Provisional(v) => v,
        }
    }

    pub fn is_settled(self) -> bool {
        matches!(self, Self::Settled(_))
    }
}

pub struct ScoreSynthesizer {
    primary: Option<Arc<dyn GuessOracle>>,
    candidate: Option<Arc<dyn GuessOracle>>,
    primary_guesses: GuessCache,
    candidate_guesses: GuessCache,
    heuristics: HashMap<(String, String), HeuristicResult>,
    heard_from_oracle: bool,
    scale: f64,
    min_oracle_score: f64,
    handle: Handle,
    events: UnboundedSender<MeterEvent>,
}

impl ScoreSynthesizer {
    pub fn new(config: &Config, handle: Handle, events: UnboundedSender<MeterEvent>) -> Self {
        Self {
            primary: None,
            candidate: None,
            primary_guesses: GuessCache::default(),
            candidate_guesses: GuessCache::default(),
            heuristics: HashMap::new(),
            heard_from_oracle: false,
            scale: config.bar_fill_stringency_scale_factor,
            min_oracle_score: config.min_nn_score_to_influence_bar,
            handle,
            events,
        }
    }

    pub fn with_oracle(mut self, mode: OracleMode, oracle: Arc<dyn GuessOracle>) -> Self {
        match mode {
            OracleMode::Primary => self.primary = Some(oracle),
            OracleMode::Candidate => self.candidate = Some(oracle),
        }
        self
    }

    fn oracle(&self, mode: OracleMode) -> Option<&Arc<dyn GuessOracle>> {
        match mode {
            OracleMode::Primary => self.primary.as_ref(),
            OracleMode::Candidate => self.candidate.as_ref(),
        }
    }

    pub fn has_oracle(&self, mode: OracleMode) -> bool {
        self.oracle(mode).is_some()
    }

    pub fn guesses(&self, mode: OracleMode) -> &GuessCache {
        match mode {
            OracleMode::Primary => &self.primary_guesses,
            OracleMode::Candidate => &self.candidate_guesses,
        }
    }

    fn guesses_mut(&mut self, mode: OracleMode) -> &mut GuessCache {
        match mode {
            OracleMode::Primary => &mut self.primary_guesses,
            OracleMode::Candidate => &mut self.candidate_guesses,
        }
    }

    /// Asks the mode's oracle about `password` unless it was already asked.
    ///
    /// Returns `true` when a request went out.
    pub fn request(&mut self, password: &str, mode: OracleMode) -> bool {
        let Some(oracle) = self.oracle(mode).cloned() else {
            return false;
        };
        if !self.guesses_mut(mode).begin(password) {
            return false;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Guess estimate requested ({:?})", mode);

        let events = self.events.clone();
        let password = password.to_string();
        self.handle.spawn(async move {
            let estimate = oracle.estimate(&password, mode).await;
            let _ = events.send(MeterEvent::Guess {
                password,
                mode,
                estimate,
            });
        });
        true
    }

    /// Records the oracle's raw answer.
    pub fn resolve(&mut self, password: &str, mode: OracleMode, raw: f64) {
        let log = log_guess_number(raw, password);

        #[cfg(feature = "tracing")]
        tracing::debug!("Guess estimate resolved ({:?}): log10 {}", mode, log);

        self.guesses_mut(mode).resolve(password, log);
        self.heard_from_oracle = true;
    }

    pub fn heuristic(&self, password: &str, username: &str) -> Option<&HeuristicResult> {
        self.heuristics
            .get(&(password.to_string(), username.to_string()))
    }

    /// Cached heuristic result, computing it on first use.
    pub fn heuristic_or_insert_with<F>(&mut self, password: &str, username: &str, score: F) -> &HeuristicResult
    where
        F: FnOnce() -> HeuristicResult,
    {
        self.heuristics
            .entry((password.to_string(), username.to_string()))
            .or_insert_with(score)
    }

    /// Drops cached heuristic results for `password` under every username.
    pub fn forget_heuristics(&mut self, password: &str) {
        self.heuristics.retain(|(pw, _), _| pw != password);
    }

    /// Meter value for `password` given its heuristic score.
    ///
    /// Heuristic-only while no oracle is configured for `mode` or none has
    /// answered yet this session. Otherwise the lower of the two once the
    /// oracle answers for this password, and half the length until then.
    pub fn synthesize(&self, password: &str, mode: OracleMode, heuristic: f64) -> ScoreEstimate {
        if password.is_empty() || !self.heard_from_oracle || !self.has_oracle(mode) {
            return ScoreEstimate::Settled(heuristic);
        }
        let len = char_len(password);
        match self.guesses(mode).get(password) {
            Some(GuessEstimate::Resolved(log)) => match oracle_score(log, len, self.scale) {
                None => ScoreEstimate::Settled(heuristic),
                Some(oracle) if self.min_oracle_score > 0.0 && oracle < self.min_oracle_score => {
                    ScoreEstimate::Settled(meter_clamp(0.0, len))
                }
                Some(oracle) => ScoreEstimate::Settled(heuristic.min(oracle)),
            },
            _ => ScoreEstimate::Provisional(meter_clamp(0.0, len)),
        }
    }
}
