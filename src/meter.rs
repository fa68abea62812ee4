//! Password meter session.
//!
//! [`PasswordMeter`] owns everything a rating needs: configuration, word
//! lists, the blacklist, the leak and oracle clients and every cache. It is
//! driven from one task. Oracle answers and leak lookups finish in the
//! background and come back as [`MeterEvent`]s, which the meter applies in
//! [`PasswordMeter::settle`], [`PasswordMeter::drain`] or
//! [`PasswordMeter::run`].

use crate::blacklist::{BlacklistError, BlacklistIndex};
use crate::config::Config;
use crate::detectors::Feedback;
use crate::dictionary::{Dictionaries, DictionaryError};
use crate::heuristic::{HeuristicResult, HeuristicScorer};
use crate::leak::{LeakService, LeakState, RangeClient};
use crate::oracle::{GuessOracle, OracleMode};
use crate::policy::{ComplianceResult, CompositionPolicyEngine};
use crate::suggestion::{SuggestionCandidate, SuggestionSearch};
use crate::synthesizer::{GuessEstimate, ScoreEstimate, ScoreSynthesizer};
use rand::SeedableRng;
use rand::rngs::StdRng;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_util::sync::CancellationToken;

/// Completion of background work.
#[derive(Debug, Clone)]
pub enum MeterEvent {
    /// Raw oracle answer for `password`.
    Guess {
        password: String,
        mode: OracleMode,
        estimate: f64,
    },
    /// A leak lookup for `password` finished.
    Leak { password: String },
}

#[derive(Error, Debug)]
pub enum MeterError {
    #[error("A tokio runtime is required to run oracle and leak requests")]
    NoRuntime,
    #[error(transparent)]
    Blacklist(#[from] BlacklistError),
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
}

/// One-line verdict for a meter value.
pub fn headline(score: f64) -> &'static str {
    if score <= 33.0 {
        "Your password is very easy to guess."
    } else if score <= 66.0 {
        "Your password could be better."
    } else if score < 100.0 {
        "Your password is pretty good."
    } else {
        "Your password appears strong."
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
    pub compliance: ComplianceResult,
    pub estimate: ScoreEstimate,
    /// Heuristic feedback, most important first.
    pub feedback: Vec<Feedback>,
    /// A stronger compliant variant, once the search has found one.
    pub suggestion: Option<SuggestionCandidate>,
    pub headline: &'static str,
}

impl Rating {
    pub fn score(&self) -> f64 {
        self.estimate.value()
    }
}

pub struct PasswordMeterBuilder {
    config: Config,
    dictionaries: Option<Dictionaries>,
    blacklist: Option<BlacklistIndex>,
    oracles: Vec<(OracleMode, Arc<dyn GuessOracle>)>,
    range_client: Option<Arc<dyn RangeClient>>,
    seed: Option<u64>,
}

impl PasswordMeterBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            dictionaries: None,
            blacklist: None,
            oracles: Vec::new(),
            range_client: None,
            seed: None,
        }
    }

    /// Word lists to match against. Defaults to the built-in pet names only.
    pub fn dictionaries(mut self, dictionaries: Dictionaries) -> Self {
        self.dictionaries = Some(dictionaries);
        self
    }

    /// A prebuilt blacklist. Without one, an active blacklist policy loads
    /// its file on [`build`](Self::build).
    pub fn blacklist(mut self, blacklist: BlacklistIndex) -> Self {
        self.blacklist = Some(blacklist);
        self
    }

    pub fn oracle(mut self, mode: OracleMode, oracle: Arc<dyn GuessOracle>) -> Self {
        self.oracles.push((mode, oracle));
        self
    }

    /// Range client for leak lookups. With the `hibp` feature an active
    /// leak policy otherwise uses [`HttpRangeClient`](crate::HttpRangeClient).
    pub fn range_client(mut self, client: Arc<dyn RangeClient>) -> Self {
        self.range_client = Some(client);
        self
    }

    /// Fixes the random edits and rewrites, for reproducible sessions.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// # Errors
    ///
    /// Returns error if:
    /// - No tokio runtime is running
    /// - The blacklist policy is active and its file cannot be loaded
    pub fn build(self) -> Result<PasswordMeter, MeterError> {
        let handle = Handle::try_current().map_err(|_| MeterError::NoRuntime)?;
        let config = self.config;

        let blacklist = match self.blacklist {
            Some(blacklist) => blacklist,
            None if config.blacklist.active => BlacklistIndex::load(&config.blacklist)?,
            None => BlacklistIndex::empty(),
        };
        let dictionaries = self
            .dictionaries
            .unwrap_or_else(Dictionaries::with_builtin_pet_names);

        let (tx, rx) = mpsc::unbounded_channel();

        #[cfg(feature = "hibp")]
        let range_client = self.range_client.or_else(|| {
            config
                .prohibit_known_leaked
                .active
                .then(|| Arc::new(crate::leak::HttpRangeClient::new()) as Arc<dyn RangeClient>)
        });
        #[cfg(not(feature = "hibp"))]
        let range_client = self.range_client;

        let leaks = range_client.map(|client| LeakService::new(client, handle.clone()).with_events(tx.clone()));

        let mut synthesizer = ScoreSynthesizer::new(&config, handle, tx);
        for (mode, oracle) in self.oracles {
            synthesizer = synthesizer.with_oracle(mode, oracle);
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let search = SuggestionSearch::new(StdRng::from_rng(&mut rng).unwrap_or_else(|_| StdRng::from_entropy()));

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Password meter ready (leak check: {}, oracles: {})",
            leaks.is_some(),
            [OracleMode::Primary, OracleMode::Candidate]
                .iter()
                .filter(|m| synthesizer.has_oracle(**m))
                .count()
        );

        Ok(PasswordMeter {
            config,
            dictionaries,
            blacklist,
            leaks,
            synthesizer,
            search,
            rng,
            events: rx,
            current: None,
        })
    }
}

pub struct PasswordMeter {
    config: Config,
    dictionaries: Dictionaries,
    blacklist: BlacklistIndex,
    leaks: Option<LeakService>,
    synthesizer: ScoreSynthesizer,
    search: SuggestionSearch,
    rng: StdRng,
    events: UnboundedReceiver<MeterEvent>,
    /// Last password and username passed to [`rate`](Self::rate).
    current: Option<(String, String)>,
}

impl PasswordMeter {
    pub fn builder(config: Config) -> PasswordMeterBuilder {
        PasswordMeterBuilder::new(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Rates `password` and makes it the current password.
    ///
    /// Schedules the oracle and leak work it needs; the rating improves as
    /// that work comes back. Rating the same password twice without events
    /// in between gives the same result.
    pub fn rate(&mut self, password: &SecretString, username: &str) -> Rating {
        let pw = password.expose_secret();
        self.current = Some((pw.to_string(), username.to_string()));
        self.rate_plain(pw, username)
    }

    /// Re-rates the current password, if any.
    pub fn current_rating(&mut self) -> Option<Rating> {
        let (password, username) = self.current.clone()?;
        Some(self.rate_plain(&password, &username))
    }

    fn rate_plain(&mut self, password: &str, username: &str) -> Rating {
        if !password.is_empty() {
            self.synthesizer.request(password, OracleMode::Primary);
        }
        let heuristic = self.heuristic_for(password, username);
        // only the rated password's own rewrite seeds the search
        if let Some(correction) = &heuristic.correction {
            self.search.seed(password, correction);
        }
        let compliance = self.evaluate(password, username, OracleMode::Primary);
        let estimate = self
            .synthesizer
            .synthesize(password, OracleMode::Primary, heuristic.score);

        if self.config.provide_concrete_password_suggestions
            && !password.is_empty()
            && estimate.is_settled()
            && compliance.compliant
            && estimate.value() < 100.0
            && !self.search.started(password)
        {
            self.start_search(password, username, estimate.value());
        }

        Rating {
            headline: headline(estimate.value()),
            compliance,
            estimate,
            feedback: heuristic.feedback,
            suggestion: self.search.accepted(password).cloned(),
        }
    }

    fn heuristic_for(&mut self, password: &str, username: &str) -> HeuristicResult {
        let scorer = HeuristicScorer::new(&self.config, &self.dictionaries, &self.blacklist)
            .with_leaks(self.leaks.as_ref());
        let rng = &mut self.rng;
        self.synthesizer
            .heuristic_or_insert_with(password, username, || scorer.score(password, username, rng))
            .clone()
    }

    fn evaluate(&self, password: &str, username: &str, mode: OracleMode) -> ComplianceResult {
        CompositionPolicyEngine::new(&self.config, &self.blacklist)
            .with_leaks(self.leaks.as_ref())
            .with_guesses(Some(self.synthesizer.guesses(mode)))
            .evaluate(password, username)
    }

    fn start_search(&mut self, password: &str, username: &str, baseline: f64) {
        let engine = CompositionPolicyEngine::new(&self.config, &self.blacklist)
            .with_leaks(self.leaks.as_ref())
            .with_guesses(Some(self.synthesizer.guesses(OracleMode::Candidate)));
        let proposal = self
            .search
            .start(password, username, baseline, |c| engine.evaluate(c, username).compliant);
        if let Some(candidate) = proposal {
            self.score_candidate(&candidate, username);
        }
    }

    fn continue_search(&mut self, base: &str, original: &str, username: &str) {
        let engine = CompositionPolicyEngine::new(&self.config, &self.blacklist)
            .with_leaks(self.leaks.as_ref())
            .with_guesses(Some(self.synthesizer.guesses(OracleMode::Candidate)));
        let proposal = self
            .search
            .propose(base, original, |c| engine.evaluate(c, username).compliant);
        if let Some(candidate) = proposal {
            self.score_candidate(&candidate, username);
        }
    }

    fn score_candidate(&mut self, candidate: &str, username: &str) {
        self.synthesizer.request(candidate, OracleMode::Candidate);
        self.heuristic_for(candidate, username);
        self.check_candidate(candidate, username);
    }

    /// Hands a candidate's score to the search once it has settled.
    fn check_candidate(&mut self, candidate: &str, username: &str) {
        if !self.search.is_pending(candidate) {
            return;
        }
        let Some(heuristic) = self.synthesizer.heuristic(candidate, username).map(|h| h.score) else {
            return;
        };
        if self.synthesizer.guesses(OracleMode::Candidate).get(candidate) == Some(GuessEstimate::InFlight) {
            return;
        }
        let estimate = self
            .synthesizer
            .synthesize(candidate, OracleMode::Candidate, heuristic);
        if !estimate.is_settled() {
            return;
        }

        let engine = CompositionPolicyEngine::new(&self.config, &self.blacklist)
            .with_leaks(self.leaks.as_ref())
            .with_guesses(Some(self.synthesizer.guesses(OracleMode::Candidate)));
        let accepted = self
            .search
            .on_scored(candidate, estimate.value(), |c, u| engine.evaluate(c, u).compliant);
        if !accepted.is_empty() {
            return;
        }

        let Some((current, current_user)) = self.current.clone() else {
            return;
        };
        if self.search.should_retry(candidate, &current) {
            #[cfg(feature = "tracing")]
            tracing::debug!("Suggestion candidate too weak, editing further");
            self.continue_search(candidate, &current, &current_user);
        }
    }

    /// Applies one background completion. Returns `true` when it may change
    /// the current password's rating.
    pub fn handle_event(&mut self, event: MeterEvent) -> bool {
        let touched = match event {
            MeterEvent::Guess {
                password,
                mode,
                estimate,
            } => {
                self.synthesizer.resolve(&password, mode, estimate);
                if mode == OracleMode::Candidate {
                    if let Some(username) = self.search.username_for_candidate(&password) {
                        self.check_candidate(&password, &username);
                    }
                }
                password
            }
            MeterEvent::Leak { password } => {
                self.synthesizer.forget_heuristics(&password);
                password
            }
        };
        match &self.current {
            Some((current, _)) => {
                *current == touched
                    || self.search.current(current) == Some(touched.as_str())
                    || self.search.accepted(current).is_some()
            }
            None => false,
        }
    }

    /// Applies every event already queued, without waiting. Returns how many.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Whether background work for the current password is still running.
    fn current_pending(&self) -> bool {
        let Some((password, _)) = &self.current else {
            return false;
        };
        let guess_pending =
            self.synthesizer.guesses(OracleMode::Primary).get(password) == Some(GuessEstimate::InFlight);
        let leak_pending = self
            .leaks
            .as_ref()
            .is_some_and(|l| l.state(password) == LeakState::InFlight);
        guess_pending || leak_pending || self.search.is_searching(password)
    }

    /// Waits until the current password has no background work left, then
    /// rates it again. `None` without a current password.
    pub async fn settle(&mut self) -> Option<Rating> {
        self.current.as_ref()?;
        loop {
            let rating = self.current_rating()?;
            if !self.current_pending() {
                return Some(rating);
            }
            match self.events.recv().await {
                Some(event) => {
                    self.handle_event(event);
                }
                None => return Some(rating),
            }
        }
    }

    /// Applies events until `token` is cancelled.
    pub async fn run(&mut self, token: CancellationToken) {
        #[cfg(feature = "tracing")]
        tracing::info!("Meter event loop is about to start...");

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                event = self.events.recv() => match event {
                    Some(event) => {
                        self.handle_event(event);
                    }
                    None => break,
                },
            }
        }

        #[cfg(feature = "tracing")]
        tracing::info!("Meter event loop stopped");
    }
}
