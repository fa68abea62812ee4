//! Pattern detectors
//!
//! Each detector is a pure function over a password that returns a numeric
//! sub-score plus optional feedback. Detectors never look at configuration
//! beyond what is passed in.

mod census;
mod context;
mod common;
mod dates;
mod keyboard;
mod placement;
mod repetition;
mod sequence;
mod structure;

pub use census::{CharClass, ClassCensus, character_classes, count_class, length_feedback};
pub use common::{common_password, common_substrings};
pub use context::{Stripped, contextual, domain_words};
pub use dates::identify_dates;
pub use keyboard::keyboard_patterns;
pub use placement::{Correction, Placement, digits_predictable, symbols_predictable, uppercase_predictable};
pub use repetition::{duplicated_characters, repeated_sections, repeats};
pub use sequence::alphabetic_sequence;
pub use structure::{skeleton, structure_predictable, STRUCTURE_COUNT};

/// One piece of advice for the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feedback {
    /// Safe to show without revealing the password.
    pub public_text: String,
    /// Quotes the offending part of the password.
    pub sensitive_text: String,
    pub reason_why: String,
    /// The offending substring, used for redundancy checks.
    pub problem_text: String,
}

/// Output of a single detector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Finding {
    pub score: usize,
    pub feedback: Option<Feedback>,
}

impl Finding {
    pub fn quiet(score: usize) -> Self {
        Self {
            score,
            feedback: None,
        }
    }

    pub fn with_feedback(score: usize, feedback: Feedback) -> Self {
        Self {
            score,
            feedback: Some(feedback),
        }
    }
}

pub(crate) fn quote(s: &str) -> String {
    format!("\"{}\"", s)
}

pub(crate) fn quote_all<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    items.iter().map(|s| quote(s.as_ref())).collect()
}

/// Longest run of equal, non-zero consecutive deltas.
///
/// Returns the start index of the run in `deltas` and the number of deltas
/// in it; a run of `n` deltas spans `n + 1` characters.
pub(crate) fn longest_delta_run<T: PartialEq>(deltas: &[T], zero: &T) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    let mut start = 0;
    for i in 1..=deltas.len() {
        if i < deltas.len() && deltas[i] == deltas[start] {
            continue;
        }
        let run = i - start;
        if deltas[start] != *zero && best.is_none_or(|(_, len)| run > len) {
            best = Some((start, run));
        }
        start = i;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_delta_run() {
        assert_eq!(longest_delta_run::<i32>(&[], &0), None);
        assert_eq!(longest_delta_run(&[1, 1, 1, -3, 1], &0), Some((0, 3)));
        assert_eq!(longest_delta_run(&[0, 0, 0, 2, 2], &0), Some((3, 2)));
        assert_eq!(longest_delta_run(&[0, 0], &0), None);
        // first of equal-length runs wins
        assert_eq!(longest_delta_run(&[5, 5, 7, 7], &0), Some((0, 2)));
    }
}
