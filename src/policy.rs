//! Composition policy checks.
//!
//! Every active dimension is evaluated independently on the password as
//! typed. The result maps each active dimension to its verdict and to the
//! requirement text shown to the user.

use crate::blacklist::BlacklistIndex;
use crate::config::Config;
use crate::detectors::{CharClass, ClassCensus, quote_all};
use crate::leak::{LeakService, LeakState};
use crate::synthesizer::GuessCache;
use crate::text::{char_len, distinct_chars};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Printable ASCII range accepted by the forbidden-character check.
const PRINTABLE: std::ops::RangeInclusive<u32> = 32..=126;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Length,
    ClassCount,
    ClassRequire,
    ClassAllow,
    ForbidChars,
    Blacklist,
    RepeatChars,
    SameChars,
    UsernameDifference,
    MinLogNnGuessNum,
    ProhibitKnownLeaked,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComplianceDetail {
    pub compliance: BTreeMap<Dimension, bool>,
    pub explanation: BTreeMap<Dimension, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComplianceResult {
    pub compliant: bool,
    pub detail: ComplianceDetail,
}

impl ComplianceResult {
    fn record(&mut self, dimension: Dimension, compliant: bool, explanation: String) {
        self.detail.compliance.insert(dimension, compliant);
        self.detail.explanation.insert(dimension, explanation);
    }

    /// Requirement texts of the failing dimensions, in dimension order.
    pub fn failures(&self) -> Vec<&str> {
        self.detail
            .compliance
            .iter()
            .filter(|(_, ok)| !**ok)
            .filter_map(|(d, _)| self.detail.explanation.get(d).map(String::as_str))
            .collect()
    }
}

const CLASS_ORDER: [CharClass; 4] = [CharClass::Lower, CharClass::Upper, CharClass::Digit, CharClass::Symbol];

fn show_char(c: char) -> String {
    if c == ' ' { "[space]".to_string() } else { c.to_string() }
}

/// Evaluates passwords against one configuration.
///
/// The blacklist, leak service and guess cache are borrowed from the
/// session. Without a leak service or guess cache the matching dimension
/// passes.
pub struct CompositionPolicyEngine<'a> {
    config: &'a Config,
    blacklist: &'a BlacklistIndex,
    leaks: Option<&'a LeakService>,
    guesses: Option<&'a GuessCache>,
}

impl<'a> CompositionPolicyEngine<'a> {
    pub fn new(config: &'a Config, blacklist: &'a BlacklistIndex) -> Self {
        Self {
            config,
            blacklist,
            leaks: None,
            guesses: None,
        }
    }

    pub fn with_leaks(mut self, leaks: Option<&'a LeakService>) -> Self {
        self.leaks = leaks;
        self
    }

    pub fn with_guesses(mut self, guesses: Option<&'a GuessCache>) -> Self {
        self.guesses = guesses;
        self
    }

    pub fn evaluate(&self, password: &str, username: &str) -> ComplianceResult {
        let config = self.config;
        let census = ClassCensus::of(password);
        let len = char_len(password);
        let mut result = ComplianceResult::default();

        if config.length.active {
            let policy = &config.length;
            let text = if policy.max_length > 0 {
                format!("Contain {}-{} characters", policy.min_length, policy.max_length)
            } else {
                format!("Contain {}+ characters", policy.min_length)
            };
            let ok = len >= policy.min_length && (policy.max_length == 0 || len <= policy.max_length);
            result.record(Dimension::Length, ok, text);
        }

        if config.class_count.active {
            let policy = &config.class_count;
            let range = if policy.max_count >= 4 {
                format!("{}+", policy.min_count)
            } else {
                format!("{}-{}", policy.min_count, policy.max_count)
            };
            let classes = census.classes();
            result.record(
                Dimension::ClassCount,
                classes >= policy.min_count && classes <= policy.max_count,
                format!("Use {} of the following: uppercase letters; lowercase letters; digits; symbols", range),
            );
        }

        if config.class_require.active {
            let required: Vec<CharClass> = CLASS_ORDER
                .into_iter()
                .filter(|c| c.enabled_in(&config.class_require))
                .collect();
            let names: Vec<&str> = required
                .iter()
                .map(|c| match c {
                    CharClass::Lower => "a lowercase letter",
                    CharClass::Upper => "an uppercase letter",
                    CharClass::Digit => "a digit",
                    CharClass::Symbol => "a symbol",
                })
                .collect();
            result.record(
                Dimension::ClassRequire,
                required.iter().all(|&c| census.has(c)),
                format!("Contain {}", names.join(" and ")),
            );
        }

        if config.class_allow.active {
            let banned: Vec<CharClass> = CLASS_ORDER
                .into_iter()
                .filter(|c| !c.enabled_in(&config.class_allow))
                .collect();
            let names: Vec<&str> = banned.iter().map(|c| c.plural_name()).collect();
            let mut text = format!("Not include {}", names.join(" or "));
            let used: Vec<String> = distinct_chars(password)
                .chars()
                .filter(|&c| banned.contains(&CharClass::of(c)))
                .map(show_char)
                .collect();
            if !used.is_empty() {
                text.push_str(&format!(" (You used {})", quote_all(&used).join(", ")));
            }
            result.record(Dimension::ClassAllow, used.is_empty(), text);
        }

        if config.forbid_chars.active {
            let listed: Vec<String> = config.forbid_chars.list.iter().map(|&c| show_char(c)).collect();
            let mut text = format!("Not include the following characters: {}", listed.join(" "));
            let used: Vec<String> = distinct_chars(password)
                .chars()
                .filter(|&c| !PRINTABLE.contains(&(c as u32)) || config.forbid_chars.list.contains(&c))
                .map(show_char)
                .collect();
            if !used.is_empty() {
                text.push_str(&format!(" (You used {})", quote_all(&used).join(", ")));
            }
            result.record(Dimension::ForbidChars, used.is_empty(), text);
        }

        if config.blacklist.active {
            let policy = &config.blacklist;
            let ok = password.is_empty()
                || policy.is_length_exempt(len)
                || !self.blacklist.rejects(&policy.normalize(password));
            result.record(Dimension::Blacklist, ok, "Not be an extremely common password".to_string());
        }

        if config.repeat_chars.active {
            let limit = config.repeat_chars.limit;
            let mut text = format!("Not repeat the same character {}+ times in a row", limit);
            let chars: Vec<char> = password.chars().collect();
            let mut repeated: Vec<String> = Vec::new();
            if limit > 0 {
                for window in chars.windows(limit) {
                    let c = window[0];
                    if window.iter().all(|&w| w == c) && !repeated.contains(&show_char(c)) {
                        repeated.push(show_char(c));
                    }
                }
            }
            if !repeated.is_empty() {
                text.push_str(&format!(" ({})", quote_all(&repeated).join(", ")));
            }
            result.record(Dimension::RepeatChars, repeated.is_empty(), text);
        }

        if config.same_chars.active {
            let policy = &config.same_chars;
            let mut counts: HashMap<char, usize> = HashMap::new();
            for c in password.chars() {
                *counts.entry(c).or_default() += 1;
            }
            let ok = len >= policy.length_exception || counts.values().all(|&n| n <= policy.limit);
            result.record(
                Dimension::SameChars,
                ok,
                format!("Not contain the same character more than {} times", policy.limit),
            );
        }

        if config.username_difference.active {
            let mut remaining = password.to_lowercase();
            let name = username.to_lowercase();
            while !name.is_empty() {
                let Some(at) = remaining.find(&name) else {
                    break;
                };
                remaining.replace_range(at..at + name.len(), "");
            }
            let ok = name.is_empty() || password.is_empty() || char_len(&remaining) >= config.username_difference.limit;
            result.record(
                Dimension::UsernameDifference,
                ok,
                "Not base your password around your username".to_string(),
            );
        }

        if config.min_log_nn_guess_num.active {
            let policy = &config.min_log_nn_guess_num;
            // unknown or pending estimates never block
            let ok = match self.guesses.and_then(|g| g.log_guesses(password)) {
                Some(log) if !log.is_nan() => log > policy.threshold,
                _ => true,
            };
            result.record(Dimension::MinLogNnGuessNum, ok, policy.rejection_feedback.clone());
        }

        if config.prohibit_known_leaked.active {
            // a password already failing only reads the cache, no lookup is scheduled
            let failing = result.detail.compliance.values().any(|&ok| !ok);
            let ok = len < config.prohibit_known_leaked.smallest_length
                || self.leaks.is_none_or(|leaks| {
                    if failing {
                        leaks.state(password) != LeakState::Leaked
                    } else {
                        !leaks.previously_leaked(password)
                    }
                });
            result.record(
                Dimension::ProhibitKnownLeaked,
                ok,
                "Not use a password found in previous security leaks".to_string(),
            );
        }

        result.compliant = result.detail.compliance.values().all(|&ok| ok);
        result
    }
}
