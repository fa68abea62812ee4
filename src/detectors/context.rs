//! Account information and site-specific terms.
//!
//! Both detectors report what they found and hand back the password with
//! the offending text removed, so later detectors score only the rest.

use super::{Feedback, Finding, quote, quote_all};
use crate::dictionary::greedy_token_scan;
use crate::text::{char_len, dedup_preserving_order, human_join, remove_first_ignore_case, substrings_min_max};
use std::collections::HashSet;

/// Shortest username overlap worth reporting.
const MIN_CONTEXT_OVERLAP: usize = 5;

/// A finding plus what is left of the password once it is cut out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stripped {
    pub finding: Finding,
    pub remaining: String,
}

impl Stripped {
    fn untouched(password: &str) -> Self {
        Self {
            finding: Finding::quiet(0),
            remaining: password.to_string(),
        }
    }
}

/// Longest overlap between the password and the username, ignoring case.
pub fn contextual(password: &str, username: &str) -> Stripped {
    let context: HashSet<String> =
        substrings_min_max(&[username.to_lowercase()], MIN_CONTEXT_OVERLAP, None)
            .into_iter()
            .collect();
    let overlap = substrings_min_max(&[password.to_lowercase()], MIN_CONTEXT_OVERLAP, None)
        .into_iter()
        .find(|s| context.contains(s));
    let Some(overlap) = overlap else {
        return Stripped::untouched(password);
    };

    let remaining = remove_first_ignore_case(password, &overlap).unwrap_or_else(|| password.to_string());
    Stripped {
        finding: Finding::with_feedback(
            char_len(&overlap),
            Feedback {
                public_text: "Don't use your account information in your password".to_string(),
                sensitive_text: format!(
                    "Don't use your account information ({}) in your password",
                    quote(&overlap)
                ),
                reason_why: "Attackers know to guess your username and email address as part of your password".to_string(),
                problem_text: overlap,
            },
        ),
        remaining,
    }
}

fn is_domain_char(c: char) -> bool {
    c.is_ascii_lowercase() || matches!(c, '0' | '1' | '3' | '4' | '5' | '@' | '$')
}

/// Site-specific terms, including leetspeak spellings of them.
pub fn domain_words<S: AsRef<str>>(password: &str, words: &[S]) -> Stripped {
    let terms: HashSet<String> = words
        .iter()
        .map(|w| w.as_ref().trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect();
    if terms.is_empty() {
        return Stripped::untouched(password);
    }

    let lowered: String = password
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .collect();
    let parts: Vec<String> = lowered
        .split(|c: char| !is_domain_char(c))
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    let hits = greedy_token_scan(parts, 1, char_len(&lowered), |variant| {
        terms.contains(variant).then_some(())
    });
    let Some(first) = hits.first() else {
        return Stripped::untouched(password);
    };

    let used: Vec<String> = hits.iter().map(|h| h.token.clone()).collect();
    let mut remaining = password.to_string();
    for token in &used {
        if let Some(cut) = remove_first_ignore_case(&remaining, token) {
            remaining = cut;
        }
    }
    let length = used.iter().map(|t| char_len(t)).sum();
    Stripped {
        finding: Finding::with_feedback(
            length,
            Feedback {
                public_text: "Don't use site-specific terms in your password".to_string(),
                sensitive_text: format!(
                    "Don't use site-specific terms ({})",
                    human_join(&quote_all(&dedup_preserving_order(&used)))
                ),
                reason_why: "Attackers target their attacks to words used on a particular service".to_string(),
                problem_text: first.token.clone(),
            },
        ),
        remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contextual_strips_username() {
        let stripped = contextual("xxJohnSmith99", "johnsmith");
        assert_eq!(stripped.finding.score, 9);
        assert_eq!(stripped.remaining, "xx99");
        let feedback = stripped.finding.feedback.unwrap();
        assert_eq!(feedback.problem_text, "johnsmith");
        assert_eq!(
            feedback.sensitive_text,
            "Don't use your account information (\"johnsmith\") in your password"
        );
    }

    #[test]
    fn test_contextual_partial_overlap() {
        let stripped = contextual("mysmithy!", "alice.smithy@example.com");
        assert_eq!(stripped.finding.score, 6);
        assert_eq!(stripped.remaining, "my!");
    }

    #[test]
    fn test_contextual_short_overlap_ignored() {
        let stripped = contextual("bobby123", "bob");
        assert_eq!(stripped, Stripped::untouched("bobby123"));
        assert_eq!(contextual("anything", "").remaining, "anything");
    }

    #[test]
    fn test_domain_words_strips_terms() {
        let stripped = domain_words("CMU4ever!", &["cmu", "ever"]);
        assert_eq!(stripped.finding.score, 7);
        assert_eq!(stripped.remaining, "4!");
        let feedback = stripped.finding.feedback.unwrap();
        assert_eq!(feedback.public_text, "Don't use site-specific terms in your password");
    }

    #[test]
    fn test_domain_words_leetspeak() {
        let stripped = domain_words("t4rt4n$", &["tartans"]);
        assert_eq!(stripped.finding.score, 7);
        assert_eq!(stripped.remaining, "");
    }

    #[test]
    fn test_domain_words_none() {
        let none: [&str; 0] = [];
        assert_eq!(domain_words("password", &none).remaining, "password");
        assert!(domain_words("password", &["cmu"]).finding.feedback.is_none());
    }
}
