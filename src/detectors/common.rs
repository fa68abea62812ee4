//! Substrings that show up across many leaked passwords.

use super::{Feedback, Finding, quote, quote_all};
use crate::dictionary::{Category, Dictionaries};
use crate::text::{human_join, substrings_no_filter};

/// Frequent password fragments, scanned in order.
///
/// A small built-in list of well-known fragments, not a ranking mined from
/// any particular breach corpus. A fragment always comes before every
/// fragment it contains so the greedy scan claims the longest match.
const COMMON_SUBSTRINGS: &[&str] = &[
    "iloveyou", "password", "qwertyuiop", "1234567890", "123456789", "12345678", "abcdefg",
    "1234567", "monkey", "dragon", "shadow", "master", "123456", "qwerty", "letmein", "sunshine",
    "princess", "football", "baseball", "welcome", "trustno", "superman", "batman", "ninja",
    "asdfgh", "zxcvbn", "passw", "12345", "54321", "11111", "00000", "abc123", "ilove", "love",
    "pass", "word", "1234", "4321", "2000", "1111", "0000", "6969", "7777", "admin", "hello",
    "qwer", "asdf", "zxcv", "abcd", "star", "baby", "angel", "girl", "boy", "123", "321", "007",
    "666", "777", "888", "999", "111", "000", "abc", "xyz", "xxx", "qaz", "wsx", "!@#",
];

/// Sums the lengths of common fragments, removing each occurrence as it is found.
pub fn common_substrings(password: &str) -> Finding {
    let mut remaining = password.to_lowercase();
    let mut matched: Vec<&str> = Vec::new();
    for &fragment in COMMON_SUBSTRINGS {
        while remaining.contains(fragment) {
            matched.push(fragment);
            // no fragment contains a space, so the cut point never rematches
            remaining = remaining.replacen(fragment, " ", 1);
        }
    }

    let Some(first) = matched.first() else {
        return Finding::quiet(0);
    };
    let count = matched.iter().map(|m| m.chars().count()).sum();
    Finding::with_feedback(
        count,
        Feedback {
            public_text: "Avoid strings of characters commonly found in passwords".to_string(),
            sensitive_text: format!(
                "Avoid strings of characters commonly found in passwords like {}",
                human_join(&quote_all(&matched))
            ),
            reason_why: "Even if they don't make sense, these strings of characters show up in many passwords, which makes them bad to use in yours.".to_string(),
            problem_text: first.to_string(),
        },
    )
}

/// Length of the longest substring (4+ characters) that is itself a common password.
pub fn common_password(password: &str, dictionaries: &Dictionaries) -> Finding {
    let hit = substrings_no_filter(password, 4)
        .into_iter()
        .find(|s| dictionaries.contains(Category::Passwords, s));
    let Some(hit) = hit else {
        return Finding::quiet(0);
    };
    Finding::with_feedback(
        hit.chars().count(),
        Feedback {
            public_text: "Avoid using very common passwords as part of your own password".to_string(),
            sensitive_text: format!(
                "Avoid using very common passwords like {} as part of your own password",
                quote(&hit)
            ),
            reason_why: "Attackers frequently use other people's common passwords as a starting point for their guesses".to_string(),
            problem_text: hit,
        },
    )
}
