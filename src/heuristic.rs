//! Heuristic scorer.
//!
//! Account information, blacklisted text and site-specific terms are cut
//! out of the password first. The rest feeds 21 detector sub-scores into a
//! fixed linear model; the result is scaled by the stringency factor and
//! clamped to the meter.

use crate::blacklist::BlacklistIndex;
use crate::config::Config;
use crate::detectors::{
    CharClass, Correction, Feedback, Finding, Stripped, alphabetic_sequence, character_classes,
    common_password, common_substrings, contextual, count_class, digits_predictable, domain_words,
    duplicated_characters, identify_dates, keyboard_patterns, length_feedback, quote,
    repeated_sections, repeats, structure_predictable, symbols_predictable, uppercase_predictable,
};
use crate::dictionary::{Dictionaries, match_words};
use crate::leak::{LeakService, LeakState};
use crate::oracle::meter_clamp;
use crate::text::{char_len, remove_first_ignore_case};
use rand::Rng;

pub const FEATURE_COUNT: usize = 21;

/// Most feedback items returned per password.
pub const MAX_FEEDBACK: usize = 3;

const INTERCEPT: f64 = 1.530;

/// Regression weights, in feature order.
const WEIGHTS: [f64; FEATURE_COUNT] = [
    0.3129,     // length
    0.9912,     // character classes
    0.04637,    // duplicated characters
    -0.03885,   // consecutive repeats
    -0.1172,    // keyboard patterns
    -0.2976,    // repeated sections
    -0.0008581, // structure
    -0.3008,    // uppercase placement
    -0.5566,    // digit placement
    0.0,        // symbol placement
    0.9108,     // uppercase count
    0.7369,     // lowercase count
    0.7578,     // digit count
    0.0,        // symbol count
    -0.1213,    // dates
    -0.2402,    // alphabetic sequences
    -0.1364,    // common substrings
    -0.5534,    // dictionary length
    1.927,      // dictionary tokens
    0.001496,   // substitution uncommonness
    -0.3946,    // common password length
];

#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicResult {
    pub features: [f64; FEATURE_COUNT],
    /// Intercept plus weighted features, before scaling.
    pub raw: f64,
    /// Scaled and clamped to `[len/2, 100]` of the scored text.
    pub score: f64,
    /// At most [`MAX_FEEDBACK`] items, most important first.
    pub feedback: Vec<Feedback>,
    /// First corrective rewrite (digits, then symbols, then uppercase).
    pub correction: Option<Correction>,
    /// What was left to score after stripping.
    pub remaining: String,
}

/// Whether `problem` mostly overlaps a problem already reported.
fn redundant(problem: &str, earlier: &[String]) -> bool {
    let problem = problem.to_lowercase();
    let len = char_len(&problem) as f64;
    if problem.is_empty() {
        return false;
    }
    earlier.iter().filter(|e| !e.is_empty()).any(|e| {
        let e = e.to_lowercase();
        let e_len = char_len(&e) as f64;
        (e.contains(&problem) && len >= 0.7 * e_len) || (problem.contains(&e) && e_len >= 0.7 * len)
    })
}

/// Keeps feedback in order, dropping items whose problem text repeats an earlier one.
fn rank_feedback(candidates: Vec<Feedback>) -> Vec<Feedback> {
    let mut kept: Vec<Feedback> = Vec::new();
    let mut problems: Vec<String> = Vec::new();
    for item in candidates {
        if redundant(&item.problem_text, &problems) {
            continue;
        }
        problems.push(item.problem_text.clone());
        kept.push(item);
        if kept.len() == MAX_FEEDBACK {
            break;
        }
    }
    kept
}

pub struct HeuristicScorer<'a> {
    config: &'a Config,
    dictionaries: &'a Dictionaries,
    blacklist: &'a BlacklistIndex,
    leaks: Option<&'a LeakService>,
}

impl<'a> HeuristicScorer<'a> {
    pub fn new(config: &'a Config, dictionaries: &'a Dictionaries, blacklist: &'a BlacklistIndex) -> Self {
        Self {
            config,
            dictionaries,
            blacklist,
            leaks: None,
        }
    }

    /// Leads the feedback with a leak warning once a lookup has confirmed one.
    pub fn with_leaks(mut self, leaks: Option<&'a LeakService>) -> Self {
        self.leaks = leaks;
        self
    }

    /// Reports and removes blacklisted text.
    ///
    /// An exact hit removes everything. A substring hit is removed when it
    /// maps back onto the password, which it does not once digits and
    /// symbols have been stripped for the lookup.
    fn strip_blacklisted(&self, password: &str) -> Stripped {
        let policy = &self.config.blacklist;
        let untouched = || Stripped {
            finding: Finding::quiet(0),
            remaining: password.to_string(),
        };
        if !policy.active || password.is_empty() || policy.is_length_exempt(char_len(password)) {
            return untouched();
        }
        let normalized = policy.normalize(password);
        let Some(hit) = self.blacklist.longest_match(&normalized) else {
            return untouched();
        };

        let remaining = match self.blacklist {
            BlacklistIndex::Exact(_) => String::new(),
            BlacklistIndex::Substring { .. } if policy.strip_digits_symbols_from_password => password.to_string(),
            BlacklistIndex::Substring { .. } => {
                remove_first_ignore_case(password, &hit).unwrap_or_else(|| password.to_string())
            }
        };
        Stripped {
            finding: Finding::with_feedback(
                char_len(&hit),
                Feedback {
                    public_text: "Avoid extremely common passwords".to_string(),
                    sensitive_text: format!("Avoid extremely common passwords like {}", quote(&hit)),
                    reason_why: "Attackers try the most common passwords first, and this one is on the list of passwords this site prohibits".to_string(),
                    problem_text: hit,
                },
            ),
            remaining,
        }
    }

    fn leak_feedback(&self, password: &str) -> Option<Feedback> {
        let leaked = self
            .leaks
            .is_some_and(|leaks| leaks.state(password) == LeakState::Leaked);
        leaked.then(|| Feedback {
            public_text: "Don't use a password that has appeared in a data breach".to_string(),
            sensitive_text: "Don't use a password that has appeared in a data breach".to_string(),
            reason_why: "Attackers try passwords exposed in previous security leaks before anything else".to_string(),
            problem_text: String::new(),
        })
    }

    pub fn score<R: Rng + ?Sized>(&self, password: &str, username: &str, rng: &mut R) -> HeuristicResult {
        let config = self.config;
        let allow = &config.class_allow;

        let context = contextual(password, username);
        let blacklisted = self.strip_blacklisted(&context.remaining);
        let domain = domain_words(&blacklisted.remaining, &config.domain_specific_words);
        let rest = domain.remaining.clone();
        let max_length = if config.length.active { config.length.max_length } else { 0 };

        let upper_placement = uppercase_predictable(&rest, rng);
        let digit_placement = digits_predictable(&rest, rng);
        let symbol_placement = symbols_predictable(&rest, rng);
        let words = match_words(&rest, self.dictionaries);

        // feature order, matching WEIGHTS
        let sections: [(&str, Finding); 17] = [
            ("length", length_feedback(char_len(&rest), max_length)),
            ("classes", character_classes(&rest, allow)),
            ("duplicated", duplicated_characters(&rest)),
            ("repeats", repeats(&rest)),
            ("keyboard", keyboard_patterns(&rest)),
            ("sections", repeated_sections(&rest)),
            ("structure", structure_predictable(&rest)),
            ("upper_placement", upper_placement.finding),
            ("digit_placement", digit_placement.finding),
            ("symbol_placement", symbol_placement.finding),
            ("upper", count_class(&rest, CharClass::Upper, CharClass::Upper.permitted_by(allow))),
            ("lower", count_class(&rest, CharClass::Lower, CharClass::Lower.permitted_by(allow))),
            ("digits", count_class(&rest, CharClass::Digit, CharClass::Digit.permitted_by(allow))),
            ("symbols", count_class(&rest, CharClass::Symbol, CharClass::Symbol.permitted_by(allow))),
            ("dates", identify_dates(&rest)),
            ("alpha_sequence", alphabetic_sequence(&rest)),
            ("common_substrings", common_substrings(&rest)),
        ];
        let common_pw = common_password(&rest, self.dictionaries);

        let mut features = [0.0; FEATURE_COUNT];
        for (i, (_, finding)) in sections.iter().enumerate() {
            features[i] = finding.score as f64;
        }
        features[17] = words.length as f64;
        features[18] = words.tokens as f64;
        features[19] = words.uncommonness;
        features[20] = common_pw.score as f64;

        let raw = INTERCEPT + WEIGHTS.iter().zip(&features).map(|(w, f)| w * f).sum::<f64>();
        // nothing left once stripped scores nothing
        let score = if rest.is_empty() {
            0.0
        } else {
            meter_clamp(raw * config.bar_fill_stringency_scale_factor, char_len(&rest))
        };

        let take = |name: &str| -> Option<Feedback> {
            sections
                .iter()
                .find(|(n, _)| *n == name)
                .and_then(|(_, f)| f.feedback.clone())
        };
        let candidates: Vec<Feedback> = [
            self.leak_feedback(password),
            context.finding.feedback.clone(),
            blacklisted.finding.feedback.clone(),
            domain.finding.feedback.clone(),
            words.feedback.clone(),
            take("keyboard"),
            take("repeats"),
            take("dates"),
            take("sections"),
            take("alpha_sequence"),
            common_pw.feedback.clone(),
            take("upper_placement"),
            take("digit_placement"),
            take("symbol_placement"),
            take("duplicated"),
            take("length"),
            take("classes"),
            take("symbols"),
            take("upper"),
            take("digits"),
            take("lower"),
            take("common_substrings"),
            take("structure"),
        ]
        .into_iter()
        .flatten()
        .collect();

        let correction = digit_placement
            .correction
            .or(symbol_placement.correction)
            .or(upper_placement.correction);

        HeuristicResult {
            features,
            raw,
            score,
            feedback: rank_feedback(candidates),
            correction,
            remaining: rest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlacklistPolicy;
    use crate::dictionary::Category;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn score_with(config: &Config, dictionaries: &Dictionaries, password: &str, username: &str) -> HeuristicResult {
        let blacklist = BlacklistIndex::empty();
        let mut rng = StdRng::seed_from_u64(11);
        HeuristicScorer::new(config, dictionaries, &blacklist).score(password, username, &mut rng)
    }

    fn score(password: &str) -> HeuristicResult {
        score_with(&Config::default(), &Dictionaries::new(), password, "")
    }

    #[test]
    fn test_empty_password() {
        let result = score("");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.features[0], 0.0);
        assert!(result.feedback.is_empty());
    }

    #[test]
    fn test_score_in_meter_range() {
        for pw in ["a", "password", "Password1", "qwerty123456", "x7$Kp!2mQz#9vL", &"ab".repeat(150)] {
            let result = score(pw);
            let floor = char_len(&result.remaining) as f64 / 2.0;
            assert!(result.score >= floor.min(100.0) && result.score <= 100.0, "{}: {}", pw, result.score);
            assert!(result.feedback.len() <= MAX_FEEDBACK);
        }
    }

    #[test]
    fn test_random_beats_common() {
        let weak = score("password");
        let strong = score("x7$Kp!2mQz#9vL");
        assert!(strong.score > weak.score);
    }

    #[test]
    fn test_features_follow_detectors() {
        let result = score("Monkey2015!");
        assert_eq!(result.features[0], 11.0);
        assert_eq!(result.features[1], 4.0);
        assert_eq!(result.features[10], 1.0);
        assert_eq!(result.features[11], 5.0);
        assert_eq!(result.features[12], 4.0);
        assert_eq!(result.features[14], 4.0);
        // capital first letter only
        assert_eq!(result.features[7], 1.0);
    }

    #[test]
    fn test_stringency_never_lowers_positive_raw() {
        let mut lenient = Config::default();
        lenient.bar_fill_stringency_scale_factor = 2.0;
        let mut strict = Config::default();
        strict.bar_fill_stringency_scale_factor = 4.0;
        let dictionaries = Dictionaries::new();

        let low = score_with(&lenient, &dictionaries, "Tr0ub4dor", "");
        let high = score_with(&strict, &dictionaries, "Tr0ub4dor", "");
        assert!(low.raw > 0.0);
        assert!(high.score >= low.score);
    }

    #[test]
    fn test_contextual_feedback_first() {
        let result = score_with(&Config::default(), &Dictionaries::new(), "johnsmith123", "johnsmith");
        assert_eq!(result.remaining, "123");
        assert_eq!(
            result.feedback[0].public_text,
            "Don't use your account information in your password"
        );
    }

    #[test]
    fn test_domain_words_removed() {
        let mut config = Config::default();
        config.domain_specific_words = vec!["acme".to_string()];
        let result = score_with(&config, &Dictionaries::new(), "acmeRocks9", "");
        assert_eq!(result.remaining, "Rocks9");
        assert_eq!(result.feedback[0].public_text, "Don't use site-specific terms in your password");
    }

    #[test]
    fn test_dictionary_feedback_and_redundancy() {
        let mut dictionaries = Dictionaries::new();
        dictionaries.insert(Category::EnglishWords, ["monkey"]);
        dictionaries.insert(Category::Passwords, ["monkeys"]);
        let result = score_with(&Config::default(), &dictionaries, "monkeys", "");

        assert_eq!(result.features[17], 6.0);
        assert_eq!(result.features[18], 1.0);
        assert_eq!(result.features[20], 7.0);
        assert_eq!(result.feedback[0].public_text, "Don't use dictionary words");
        // "monkeys" overlaps "monkey", so the common-password item is dropped
        assert!(result
            .feedback
            .iter()
            .all(|f| !f.public_text.starts_with("Avoid using very common passwords")));
    }

    #[test]
    fn test_exact_blacklist_hit_strips_everything() {
        let mut config = Config::default();
        config.blacklist = BlacklistPolicy {
            active: true,
            ..BlacklistPolicy::default()
        };
        let blacklist = BlacklistIndex::from_entries(&config.blacklist, ["letmein"]);
        let dictionaries = Dictionaries::new();
        let mut rng = StdRng::seed_from_u64(3);
        let result = HeuristicScorer::new(&config, &dictionaries, &blacklist).score("LetMeIn", "", &mut rng);

        assert_eq!(result.remaining, "");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.feedback[0].problem_text, "letmein");
    }

    #[test]
    fn test_substring_blacklist_hit_is_cut_out() {
        let mut config = Config::default();
        config.blacklist = BlacklistPolicy {
            active: true,
            check_substrings: true,
            ..BlacklistPolicy::default()
        };
        let blacklist = BlacklistIndex::from_entries(&config.blacklist, ["dragon"]);
        let dictionaries = Dictionaries::new();
        let mut rng = StdRng::seed_from_u64(3);
        let result = HeuristicScorer::new(&config, &dictionaries, &blacklist).score("myDragon77", "", &mut rng);
        assert_eq!(result.remaining, "my77");
    }

    #[test]
    fn test_correction_prefers_digits() {
        let result = score("monkeybusiness123");
        let correction = result.correction.expect("digits at the end get moved");
        assert!(!correction.password.ends_with("123"));
        assert_eq!(correction.mask.len(), char_len(&correction.password));
    }

    #[test]
    fn test_redundant() {
        let earlier = vec!["Password".to_string(), String::new()];
        assert!(redundant("passwor", &earlier));
        assert!(redundant("password1", &earlier));
        assert!(!redundant("pass", &earlier));
        assert!(!redundant("", &earlier));
    }
}
