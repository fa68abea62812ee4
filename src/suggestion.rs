//! Concrete suggestion search.
//!
//! For a compliant password that could be stronger, random single-character
//! edits are proposed until one passes the policy, then scored. A scored
//! candidate that is strong enough and clearly better than the original
//! becomes the suggestion; a weaker one becomes the base for the next edit.

use crate::detectors::Correction;
use crate::text::char_len;
use rand::Rng;
use rand::rngs::StdRng;
use std::collections::{HashMap, HashSet};

/// Edits tried per proposal before giving up on a compliant candidate.
pub const MAX_ATTEMPTS: usize = 8;
/// Compliant candidates scored per original password.
pub const MAX_TRIES: usize = 8;
/// Lowest score a suggestion may have.
pub const ACCEPT_SCORE: f64 = 67.0;
/// How far a suggestion must beat the original.
pub const MIN_IMPROVEMENT: f64 = 15.0;

/// First printable ASCII character.
const PRINTABLE_START: u8 = 32;
/// Last printable ASCII character.
const PRINTABLE_END: u8 = 126;

/// An accepted suggestion.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionCandidate {
    pub password: String,
    /// `true` for every character that differs from the original.
    pub mask: Vec<bool>,
    pub original: String,
    pub score: f64,
    /// Candidates scored before this one was accepted.
    pub tries: usize,
}

#[derive(Debug, Clone)]
struct Origin {
    username: String,
    baseline: f64,
}

#[derive(Debug)]
pub struct SuggestionSearch {
    rng: StdRng,
    origins: HashMap<String, Origin>,
    /// Corrective rewrite to start from, per original.
    seeds: HashMap<String, String>,
    /// Change mask per candidate.
    masks: HashMap<String, Vec<bool>>,
    /// Latest compliant candidate per original.
    current: HashMap<String, String>,
    tries: HashMap<String, usize>,
    pending: HashSet<String>,
    accepted: HashMap<String, SuggestionCandidate>,
}

impl SuggestionSearch {
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng,
            origins: HashMap::new(),
            seeds: HashMap::new(),
            masks: HashMap::new(),
            current: HashMap::new(),
            tries: HashMap::new(),
            pending: HashSet::new(),
            accepted: HashMap::new(),
        }
    }

    /// Records a corrective rewrite of `original` as the first base to edit.
    /// The first rewrite seen wins.
    pub fn seed(&mut self, original: &str, correction: &Correction) {
        if self.seeds.contains_key(original) {
            return;
        }
        self.seeds
            .insert(original.to_string(), correction.password.clone());
        self.masks
            .entry(correction.password.clone())
            .or_insert_with(|| correction.mask.clone());
    }

    pub fn accepted(&self, original: &str) -> Option<&SuggestionCandidate> {
        self.accepted.get(original)
    }

    /// The latest compliant candidate for `original`.
    pub fn current(&self, original: &str) -> Option<&str> {
        self.current.get(original).map(String::as_str)
    }

    pub fn tries(&self, original: &str) -> usize {
        self.tries.get(original).copied().unwrap_or(0)
    }

    /// Whether `candidate` is waiting for its score.
    pub fn is_pending(&self, candidate: &str) -> bool {
        self.pending.contains(candidate)
    }

    /// Whether the search for `original` is waiting on a score.
    pub fn is_searching(&self, original: &str) -> bool {
        self.current(original).is_some_and(|c| self.is_pending(c))
    }

    /// Whether a search for `original` was ever started.
    pub fn started(&self, original: &str) -> bool {
        self.origins.contains_key(original)
    }

    /// Starts searching for a stronger variant of `original`, whose own
    /// settled score is `baseline`.
    pub fn start<F>(&mut self, original: &str, username: &str, baseline: f64, compliant: F) -> Option<String>
    where
        F: FnMut(&str) -> bool,
    {
        if self.accepted.contains_key(original) {
            return None;
        }
        self.origins.insert(
            original.to_string(),
            Origin {
                username: username.to_string(),
                baseline,
            },
        );

        #[cfg(feature = "tracing")]
        tracing::debug!("Suggestion search started");

        self.propose(original, original, compliant)
    }

    /// Edits `base` until a candidate passes `compliant`, at most
    /// [`MAX_ATTEMPTS`] times. The candidate becomes current for `original`
    /// and is returned for scoring.
    pub fn propose<F>(&mut self, base: &str, original: &str, mut compliant: F) -> Option<String>
    where
        F: FnMut(&str) -> bool,
    {
        // a rewrite only stands in for the original itself
        let seeded = if base == original { self.seeds.get(base).cloned() } else { None };
        let start = seeded.unwrap_or_else(|| base.to_string());
        let mask = self
            .masks
            .get(&start)
            .cloned()
            .unwrap_or_else(|| vec![false; char_len(&start)]);

        for _ in 0..MAX_ATTEMPTS {
            let (candidate, candidate_mask) = self.mutate(&start, &mask);
            if !compliant(&candidate) {
                continue;
            }

            #[cfg(feature = "tracing")]
            tracing::debug!("Suggestion candidate proposed");

            self.masks
                .entry(candidate.clone())
                .or_insert(candidate_mask);
            self.current
                .insert(original.to_string(), candidate.clone());
            *self.tries.entry(original.to_string()).or_insert(0) += 1;
            self.pending.insert(candidate.clone());
            return Some(candidate);
        }
        None
    }

    /// One random edit: toggle case, substitute or insert, weighted 2:2:4.
    fn mutate(&mut self, base: &str, mask: &[bool]) -> (String, Vec<bool>) {
        let mut chars: Vec<char> = base.chars().collect();
        let mut mask = mask.to_vec();
        mask.resize(chars.len(), false);

        let selection = if chars.is_empty() { 4 } else { self.rng.gen_range(0..8) };
        match selection {
            0 | 1 => {
                let at = self.rng.gen_range(0..chars.len());
                let c = chars[at];
                if c.is_ascii_uppercase() {
                    chars[at] = c.to_ascii_lowercase();
                    mask[at] = true;
                } else if c.is_ascii_lowercase() {
                    chars[at] = c.to_ascii_uppercase();
                    mask[at] = true;
                }
            }
            2 | 3 => {
                let replacement = self.printable();
                let at = self.rng.gen_range(0..chars.len());
                if chars[at] != replacement {
                    mask[at] = true;
                }
                chars[at] = replacement;
            }
            _ => {
                let inserted = self.printable();
                let at = self.rng.gen_range(0..=chars.len());
                chars.insert(at, inserted);
                mask.insert(at, true);
            }
        }
        (chars.into_iter().collect(), mask)
    }

    fn printable(&mut self) -> char {
        char::from(self.rng.gen_range(PRINTABLE_START..=PRINTABLE_END))
    }

    /// Takes the settled score of `candidate`.
    ///
    /// Every original whose current candidate this is, and which has no
    /// suggestion yet, accepts it when it scores at least [`ACCEPT_SCORE`]
    /// and beats the original by [`MIN_IMPROVEMENT`]. `compliant` re-checks
    /// the candidate against the original's username first. Returns the
    /// originals that accepted.
    pub fn on_scored<F>(&mut self, candidate: &str, score: f64, mut compliant: F) -> Vec<String>
    where
        F: FnMut(&str, &str) -> bool,
    {
        if !self.pending.remove(candidate) {
            return Vec::new();
        }
        if score < ACCEPT_SCORE {
            return Vec::new();
        }

        let waiting: Vec<String> = self
            .current
            .iter()
            .filter(|(original, c)| c.as_str() == candidate && !self.accepted.contains_key(*original))
            .map(|(original, _)| original.clone())
            .collect();

        let mut accepted = Vec::new();
        for original in waiting {
            let Some(origin) = self.origins.get(&original) else {
                continue;
            };
            if score < origin.baseline + MIN_IMPROVEMENT {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    "Suggestion not enough of an improvement ({} -> {})",
                    origin.baseline,
                    score
                );
                continue;
            }
            if !compliant(candidate, &origin.username) {
                continue;
            }

            #[cfg(feature = "tracing")]
            tracing::info!("Suggestion accepted with score {}", score);

            let mask = self
                .masks
                .get(candidate)
                .cloned()
                .unwrap_or_else(|| vec![false; char_len(candidate)]);
            let tries = self.tries(&original);
            self.accepted.insert(
                original.clone(),
                SuggestionCandidate {
                    password: candidate.to_string(),
                    mask,
                    original: original.clone(),
                    score,
                    tries,
                },
            );
            accepted.push(original);
        }
        accepted
    }

    /// Whether a scored `candidate` should be edited further on behalf of
    /// `original`: it is still the current candidate, nothing was accepted
    /// and tries remain.
    pub fn should_retry(&self, candidate: &str, original: &str) -> bool {
        self.current(original) == Some(candidate)
            && !self.accepted.contains_key(original)
            && self.tries(original) < MAX_TRIES
    }

    pub fn username_of(&self, original: &str) -> Option<&str> {
        self.origins.get(original).map(|o| o.username.as_str())
    }

    /// Username of an original currently editing `candidate`.
    pub fn username_for_candidate(&self, candidate: &str) -> Option<String> {
        self.current
            .iter()
            .find(|(_, c)| c.as_str() == candidate)
            .and_then(|(original, _)| self.username_of(original))
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blacklist::BlacklistIndex;
    use crate::config::Config;
    use crate::policy::CompositionPolicyEngine;
    use rand::SeedableRng;

    fn search(seed: u64) -> SuggestionSearch {
        SuggestionSearch::new(StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_mutate_changes_one_character() {
        let mut search = search(7);
        for _ in 0..200 {
            let (candidate, mask) = search.mutate("abcdef", &[false; 6]);
            let len = char_len(&candidate);
            assert!(len == 6 || len == 7);
            assert_eq!(mask.len(), len);
            assert!(mask.iter().filter(|m| **m).count() <= 1);
            assert!(candidate.chars().all(|c| (' '..='~').contains(&c)));
        }
    }

    #[test]
    fn test_mutate_empty_only_inserts() {
        let mut search = search(1);
        for _ in 0..50 {
            let (candidate, mask) = search.mutate("", &[]);
            assert_eq!(char_len(&candidate), 1);
            assert_eq!(mask, vec![true]);
        }
    }

    #[test]
    fn test_propose_respects_policy() {
        let config = Config::default();
        let blacklist = BlacklistIndex::empty();
        let engine = CompositionPolicyEngine::new(&config, &blacklist);
        let mut search = search(42);

        for _ in 0..20 {
            if let Some(candidate) = search.propose("tr0ub4dor", "tr0ub4dor", |c| engine.evaluate(c, "").compliant) {
                assert!(engine.evaluate(&candidate, "").compliant);
                assert_eq!(search.current("tr0ub4dor"), Some(candidate.as_str()));
                assert!(search.is_pending(&candidate));
            }
        }
        assert!(search.tries("tr0ub4dor") > 0);
    }

    /// Whether the characters `mask` leaves unmarked appear in `original` in order.
    fn unmarked_within(candidate: &str, mask: &[bool], original: &str) -> bool {
        let mut rest = original.chars();
        candidate
            .chars()
            .zip(mask)
            .filter(|(_, marked)| !**marked)
            .all(|(c, _)| rest.any(|o| o == c))
    }

    #[test]
    fn test_seed_only_applies_to_its_original() {
        let mut search = search(13);
        search.seed(
            "wordpass9",
            &Correction {
                password: "zzzzzzzzz".to_string(),
                mask: vec![false; 9],
            },
        );
        // "wordpass9" is being edited as a candidate of another original here
        for _ in 0..20 {
            let candidate = search.propose("wordpass9", "wordpass", |_| true).unwrap();
            let mask = &search.masks[&candidate];
            assert!(unmarked_within(&candidate, mask, "wordpass9"));
        }
    }

    #[test]
    fn test_propose_gives_up_when_nothing_complies() {
        let mut search = search(3);
        assert_eq!(search.propose("abc", "abc", |_| false), None);
        assert_eq!(search.tries("abc"), 0);
        assert!(search.current("abc").is_none());
    }

    #[test]
    fn test_propose_starts_from_seed() {
        let mut search = search(9);
        search.seed(
            "password1",
            &Correction {
                password: "pass1word".to_string(),
                mask: vec![false, false, false, false, true, false, false, false, false],
            },
        );
        let candidate = search.propose("password1", "password1", |_| true).unwrap();
        let mask = &search.masks[&candidate];
        // the moved digit stays highlighted
        assert!(mask.iter().filter(|m| **m).count() >= 1);
        assert_ne!(candidate, "password1");
    }

    #[test]
    fn test_on_scored_accepts_clear_improvement() {
        let mut search = search(5);
        let candidate = search.start("monkey12", "", 30.0, |_| true).unwrap();

        let accepted = search.on_scored(&candidate, 80.0, |_, _| true);
        assert_eq!(accepted, vec!["monkey12".to_string()]);

        let suggestion = search.accepted("monkey12").unwrap();
        assert_eq!(suggestion.password, candidate);
        assert_eq!(suggestion.original, "monkey12");
        assert_eq!(suggestion.tries, 1);
        assert_eq!(suggestion.mask.len(), char_len(&candidate));
        assert!(!search.should_retry(&candidate, "monkey12"));
        // no restart once accepted
        assert_eq!(search.start("monkey12", "", 30.0, |_| true), None);
    }

    #[test]
    fn test_on_scored_rejects_small_gain() {
        let mut search = search(5);
        let candidate = search.start("monkey12", "", 60.0, |_| true).unwrap();

        assert!(search.on_scored(&candidate, 70.0, |_, _| true).is_empty());
        assert!(search.accepted("monkey12").is_none());
        assert!(search.should_retry(&candidate, "monkey12"));
        // a second report for the same candidate is ignored
        assert!(search.on_scored(&candidate, 99.0, |_, _| true).is_empty());
    }

    #[test]
    fn test_retry_budget() {
        let mut search = search(11);
        let mut candidate = search.start("monkey12", "", 10.0, |_| true).unwrap();
        while search.should_retry(&candidate, "monkey12") {
            search.on_scored(&candidate, 20.0, |_, _| true);
            candidate = search.propose(&candidate, "monkey12", |_| true).unwrap();
        }
        assert_eq!(search.tries("monkey12"), MAX_TRIES);
    }

    #[test]
    fn test_accepted_suggestion_is_always_compliant() {
        let mut config = Config::default();
        config.class_count.active = true;
        config.class_count.min_count = 3;
        let blacklist = BlacklistIndex::empty();
        let engine = CompositionPolicyEngine::new(&config, &blacklist);

        for seed in 0..30 {
            let mut search = search(seed);
            let original = "Monkey12";
            let Some(candidate) = search.start(original, "", 0.0, |c| engine.evaluate(c, "").compliant) else {
                continue;
            };
            search.on_scored(&candidate, 90.0, |c, u| engine.evaluate(c, u).compliant);
            if let Some(suggestion) = search.accepted(original) {
                assert!(engine.evaluate(&suggestion.password, "").compliant);
            }
        }
    }
}
