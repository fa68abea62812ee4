//! Repetition detectors: runs, duplicated characters and repeated sections.

use super::{Feedback, Finding, quote, quote_all};
use crate::text::{dedup_preserving_order, human_join};

/// Longest run of one character repeated back to back.
///
/// A run of 1 scores 0. Runs of three or more produce feedback.
pub fn repeats(password: &str) -> Finding {
    let chars: Vec<char> = password.chars().collect();
    let mut best = (1, chars.first().copied());
    let mut current = 1;
    for i in 1..chars.len() {
        if chars[i] == chars[i - 1] {
            current += 1;
            if current > best.0 {
                best = (current, Some(chars[i]));
            }
        } else {
            current = 1;
        }
    }

    let (run, repeated) = best;
    let Some(repeated) = repeated.filter(|_| run >= 3) else {
        return Finding::quiet(if run == 1 { 0 } else { run });
    };
    let problem: String = std::iter::repeat_n(repeated, run).collect();
    Finding::with_feedback(
        run,
        Feedback {
            public_text: "Don't repeat the same character many times in a row".to_string(),
            sensitive_text: format!(
                "Don't repeat the same character ({}) many times in a row",
                quote(&problem)
            ),
            reason_why: "Hitting the same key over and over adds little to your password's strength".to_string(),
            problem_text: problem,
        },
    )
}

/// Characters that repeat an earlier character anywhere in the password.
///
/// `zcbm` has 0, `zcbmcb` has 2. Flagged when at most half the characters,
/// and no more than five, are distinct.
pub fn duplicated_characters(password: &str) -> Finding {
    let chars: Vec<char> = password.chars().collect();
    let mut uniques = dedup_preserving_order(&chars);
    let count = chars.len() - uniques.len();

    let flagged = !chars.is_empty() && uniques.len() * 2 <= chars.len() && uniques.len() <= 5;
    if !flagged {
        return Finding::quiet(count);
    }

    uniques.sort_unstable();
    let shown: Vec<String> = uniques.iter().map(char::to_string).collect();
    let plural = if uniques.len() > 1 { "s" } else { "" };
    Finding::with_feedback(
        count,
        Feedback {
            public_text: "Have more variety in the characters you choose".to_string(),
            sensitive_text: format!(
                "Have more variety than repeating the same {} character{} ({})",
                uniques.len(),
                plural,
                human_join(&quote_all(&shown))
            ),
            reason_why: "Passwords that use only a few different characters are easy for attackers to guess"
                .to_string(),
            problem_text: String::new(),
        },
    )
}

/// Characters taken up by a section that reappears, forwards or mirrored.
///
/// Lengths are tried from half the password down to 3 and the first length
/// with any reappearance wins. Only matches of four or more characters in
/// total produce feedback.
pub fn repeated_sections(password: &str) -> Finding {
    let chars: Vec<char> = password.to_lowercase().chars().collect();
    let n = chars.len();
    let mut count = 0;
    let mut problem = String::new();
    let mut backwards = false;

    for len in (3..=n / 2).rev() {
        for start in 0..=n - len {
            let forwards = &chars[start..start + len];
            let mirrored: Vec<char> = forwards.iter().rev().copied().collect();

            let before = (0..).take_while(|i| i + len <= start);
            let after = (start + len..).take_while(|i| i + len <= n);
            for i in before.chain(after) {
                let window = &chars[i..i + len];
                if window == forwards {
                    count += len;
                    problem = forwards.iter().collect();
                } else if window == &mirrored[..] {
                    count += len;
                    problem = forwards.iter().collect();
                    backwards = true;
                }
            }
            if count >= 3 {
                break;
            }
        }
        if count > 0 {
            break;
        }
    }

    if count < 4 {
        return Finding::quiet(count);
    }
    let suffix = if backwards { ", forwards or backwards" } else { "" };
    Finding::with_feedback(
        count,
        Feedback {
            public_text: format!("Avoid repeating sections{}", suffix),
            sensitive_text: format!("Avoid repeating sections ({}){}", quote(&problem), suffix),
            reason_why: "In their guessing, attackers know to try duplicating parts of the password".to_string(),
            problem_text: problem,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeats() {
        let finding = repeats("paaaass");
        assert_eq!(finding.score, 4);
        assert_eq!(finding.feedback.unwrap().problem_text, "aaaa");

        assert_eq!(repeats("aab").score, 2);
        assert!(repeats("aab").feedback.is_none());
        assert_eq!(repeats("abc").score, 0);
        assert_eq!(repeats("").score, 0);
    }

    #[test]
    fn test_duplicated_characters() {
        assert_eq!(duplicated_characters("zcbm").score, 0);
        assert_eq!(duplicated_characters("zcbmcb").score, 2);
        assert!(duplicated_characters("zcbmcb").feedback.is_none());

        let finding = duplicated_characters("abababab");
        assert_eq!(finding.score, 6);
        let feedback = finding.feedback.unwrap();
        assert_eq!(
            feedback.sensitive_text,
            "Have more variety than repeating the same 2 characters (\"a\" and \"b\")"
        );
        assert!(duplicated_characters("").feedback.is_none());
    }

    #[test]
    fn test_repeated_sections_forwards() {
        let finding = repeated_sections("cmucmu");
        assert_eq!(finding.score, 3);
        assert!(finding.feedback.is_none());

        let finding = repeated_sections("Dragondragon");
        assert_eq!(finding.score, 6);
        let feedback = finding.feedback.unwrap();
        assert_eq!(feedback.problem_text, "dragon");
        assert_eq!(feedback.public_text, "Avoid repeating sections");
    }

    #[test]
    fn test_repeated_sections_mirrored() {
        let finding = repeated_sections("abcd1dcba");
        assert_eq!(finding.score, 4);
        let feedback = finding.feedback.unwrap();
        assert!(feedback.public_text.ends_with("forwards or backwards"));
    }

    #[test]
    fn test_repeated_sections_none() {
        assert_eq!(repeated_sections("abcdefgh").score, 0);
        assert_eq!(repeated_sections("ab").score, 0);
    }
}
