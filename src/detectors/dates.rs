//! Date detection.
//!
//! Formats are tried from most to least specific. Each match is cut out of
//! the password before the next format runs, so a full date is never also
//! counted as a bare year.

use super::{Feedback, Finding, quote_all};
use crate::text::human_join;
use regex::Regex;
use std::sync::LazyLock;

const DEL: &str = "[ ./-]";
const MM: &str = "(?:0[0-9]|1[012]|[0-9])";
const MMMM: &str = "(?:january|february|march|april|may|june|july|august|september|october|november|december)";
const DD: &str = "(?:[012][0-9]|3[01])";
const YY: &str = "[0-9]{2}";
const YYYY: &str = "(?:19[0-9]{2}|20[01234][0-9])";

static DATE_FORMATS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!("{MM}{DEL}{DD}{DEL}{YYYY}"),
        format!("{DD}{DEL}{MM}{DEL}{YYYY}"),
        format!("{MM}{DEL}{DD}{DEL}{YY}"),
        format!("{DD}{DEL}{MM}{DEL}{YY}"),
        format!("{MM}{DD}{YYYY}"),
        format!("{DD}{MM}{YYYY}"),
        format!("(?i){MMMM}{YYYY}"),
        format!("(?i){MMMM}{YY}"),
        format!("{MM}{DEL}{DD}"),
        format!("{DD}{DEL}{MM}"),
        YYYY.to_string(),
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("date patterns are valid"))
    .collect()
});

/// Cuts every match of `rx` out of `parts`, returning the matched strings.
fn cut_matches(parts: &mut Vec<String>, rx: &Regex) -> Vec<String> {
    let mut matched = Vec::new();
    let mut revised = Vec::with_capacity(parts.len());
    for part in parts.iter() {
        let mut last = 0;
        for m in rx.find_iter(part) {
            matched.push(m.as_str().to_string());
            if m.start() > last {
                revised.push(part[last..m.start()].to_string());
            }
            last = m.end();
        }
        if last < part.len() {
            revised.push(part[last..].to_string());
        }
    }
    *parts = revised;
    matched
}

/// Number of characters that belong to a date or year.
pub fn identify_dates(password: &str) -> Finding {
    let mut parts = vec![password.to_string()];
    let mut dates: Vec<String> = Vec::new();
    for rx in DATE_FORMATS.iter() {
        dates.extend(cut_matches(&mut parts, rx));
    }

    let count: usize = dates.iter().map(|d| d.chars().count()).sum();
    let Some(first) = dates.first().cloned() else {
        return Finding::quiet(0);
    };
    Finding::with_feedback(
        count,
        Feedback {
            public_text: "Avoid using dates".to_string(),
            sensitive_text: format!("Avoid using dates like {}", human_join(&quote_all(&dates))),
            reason_why: "Dates and years in any format are quite common in passwords".to_string(),
            problem_text: first,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_dates_full_date() {
        let finding = identify_dates("born12/25/1990!");
        assert_eq!(finding.score, 10);
        let feedback = finding.feedback.unwrap();
        assert_eq!(feedback.problem_text, "12/25/1990");
    }

    #[test]
    fn test_identify_dates_month_name() {
        let finding = identify_dates("xxJune2015");
        assert_eq!(finding.score, 8);
        assert_eq!(finding.feedback.unwrap().problem_text, "June2015");
    }

    #[test]
    fn test_identify_dates_year_only_counts_once() {
        let finding = identify_dates("pass1987word2024");
        assert_eq!(finding.score, 8);
        let feedback = finding.feedback.unwrap();
        assert_eq!(feedback.sensitive_text, "Avoid using dates like \"1987\" and \"2024\"");
    }

    #[test]
    fn test_identify_dates_none() {
        let finding = identify_dates("password");
        assert_eq!(finding.score, 0);
        assert!(finding.feedback.is_none());
        // out of the recognised year range
        assert_eq!(identify_dates("abc2077").score, 0);
    }
}
