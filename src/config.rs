//! Meter configuration.
//!
//! Every policy dimension has its own section with an `active` switch.
//! Keys deserialize from camelCase so existing policy files load unchanged.

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub length: LengthPolicy,
    pub class_count: ClassCountPolicy,
    pub class_require: ClassSwitches,
    pub class_allow: ClassSwitches,
    pub forbid_chars: ForbidCharsPolicy,
    pub repeat_chars: LimitPolicy,
    pub same_chars: SameCharsPolicy,
    pub username_difference: LimitPolicy,
    pub min_log_nn_guess_num: GuessThresholdPolicy,
    pub prohibit_known_leaked: LeakPolicy,
    pub blacklist: BlacklistPolicy,
    /// Multiplier applied to raw heuristic and log10 oracle values before clamping.
    pub bar_fill_stringency_scale_factor: f64,
    /// Oracle scores below this show the length floor instead. 0 disables.
    pub min_nn_score_to_influence_bar: f64,
    pub provide_concrete_password_suggestions: bool,
    /// Site-specific terms that count for nothing in a password.
    pub domain_specific_words: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            length: LengthPolicy::default(),
            class_count: ClassCountPolicy::default(),
            class_require: ClassSwitches {
                active: false,
                upper_case: false,
                lower_case: true,
                digits: true,
                symbols: false,
            },
            class_allow: ClassSwitches {
                active: false,
                upper_case: true,
                lower_case: true,
                digits: true,
                symbols: true,
            },
            forbid_chars: ForbidCharsPolicy::default(),
            repeat_chars: LimitPolicy {
                active: true,
                limit: 3,
            },
            same_chars: SameCharsPolicy::default(),
            username_difference: LimitPolicy {
                active: true,
                limit: 1,
            },
            min_log_nn_guess_num: GuessThresholdPolicy::default(),
            prohibit_known_leaked: LeakPolicy::default(),
            blacklist: BlacklistPolicy::default(),
            bar_fill_stringency_scale_factor: 67.0 / 15.0,
            min_nn_score_to_influence_bar: 0.0,
            provide_concrete_password_suggestions: true,
            domain_specific_words: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LengthPolicy {
    pub active: bool,
    pub min_length: usize,
    /// 0 means no maximum.
    pub max_length: usize,
}

impl Default for LengthPolicy {
    fn default() -> Self {
        Self {
            active: true,
            min_length: 8,
            max_length: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassCountPolicy {
    pub active: bool,
    pub min_count: usize,
    pub max_count: usize,
}

impl Default for ClassCountPolicy {
    fn default() -> Self {
        Self {
            active: false,
            min_count: 1,
            max_count: 4,
        }
    }
}

/// One switch per character class. Used both for required and permitted classes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassSwitches {
    pub active: bool,
    pub upper_case: bool,
    pub lower_case: bool,
    pub digits: bool,
    pub symbols: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForbidCharsPolicy {
    pub active: bool,
    pub list: Vec<char>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LimitPolicy {
    pub active: bool,
    pub limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SameCharsPolicy {
    pub active: bool,
    pub limit: usize,
    pub length_exception: usize,
}

impl Default for SameCharsPolicy {
    fn default() -> Self {
        Self {
            active: false,
            limit: 3,
            length_exception: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GuessThresholdPolicy {
    pub active: bool,
    /// Minimum log10 guess number.
    pub threshold: f64,
    pub rejection_feedback: String,
}

impl Default for GuessThresholdPolicy {
    fn default() -> Self {
        Self {
            active: false,
            threshold: 7.0,
            rejection_feedback: "Not be similar to extremely common passwords".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LeakPolicy {
    pub active: bool,
    /// Passwords shorter than this skip the leak check.
    pub smallest_length: usize,
}

impl Default for LeakPolicy {
    fn default() -> Self {
        Self {
            active: false,
            smallest_length: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlacklistPolicy {
    pub active: bool,
    pub blacklist_file: Option<PathBuf>,
    pub case_sensitive: bool,
    pub strip_digits_symbols_from_password: bool,
    pub check_substrings: bool,
    pub check_substring_length: usize,
    /// -1 disables the exemption.
    pub length_exception: i64,
}

impl Default for BlacklistPolicy {
    fn default() -> Self {
        Self {
            active: false,
            blacklist_file: None,
            case_sensitive: false,
            strip_digits_symbols_from_password: false,
            check_substrings: false,
            check_substring_length: 4,
            length_exception: 20,
        }
    }
}

impl BlacklistPolicy {
    /// Whether a password of `len` characters skips the blacklist check.
    pub fn is_length_exempt(&self, len: usize) -> bool {
        self.length_exception >= 0 && len as i64 >= self.length_exception
    }

    /// Normalizes a password the way blacklist entries are stored.
    pub fn normalize(&self, password: &str) -> String {
        let stripped: String = if self.strip_digits_symbols_from_password {
            password.chars().filter(|c| c.is_ascii_alphabetic()).collect()
        } else {
            password.to_string()
        };
        if self.case_sensitive {
            stripped
        } else {
            stripped.to_lowercase()
        }
    }
}
