//! Leetspeak reversal.
//!
//! Produces the plain-letter readings of a token such as `p4ssw0rd`, each
//! tagged with how common its rarest substitution is (100 = untouched).

/// Passwords longer than this are never expanded.
pub const MAX_SUBSTITUTION_LENGTH: usize = 14;

/// Commonness of the unsubstituted token.
pub const LITERAL_COMMONNESS: f64 = 100.0;

const SUBSTITUTIONS: &[(char, &[(&str, f64)])] = &[
    ('0', &[("o", 16.2)]),
    ('1', &[("i", 7.6)]),
    ('3', &[("e", 12.4)]),
    ('4', &[("for", 6.8), ("a", 3.1)]),
    ('5', &[("s", 2.0)]),
    ('u', &[("o", 2.8)]),
    ('U', &[("o", 2.8)]),
    ('z', &[("s", 2.5)]),
    ('Z', &[("s", 2.5)]),
    ('@', &[("a", 7.8)]),
    ('$', &[("s", 3.9)]),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub candidate: String,
    /// Length drift from multi-character replacements so far.
    pub offset: usize,
    /// Minimum weight along the substitution chain.
    pub commonness: f64,
}

impl Variant {
    pub fn literal(token: &str) -> Self {
        Self {
            candidate: token.to_string(),
            offset: 0,
            commonness: LITERAL_COMMONNESS,
        }
    }

    pub fn is_literal(&self) -> bool {
        self.commonness >= LITERAL_COMMONNESS
    }
}

fn replacements(c: char) -> &'static [(&'static str, f64)] {
    SUBSTITUTIONS
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
        .unwrap_or(&[])
}

fn has_letter_context(chars: &[char], i: usize) -> bool {
    let near = [i.checked_sub(1), i.checked_sub(2), Some(i + 1), Some(i + 2)];
    near.into_iter()
        .flatten()
        .any(|j| chars.get(j).is_some_and(char::is_ascii_alphabetic))
}

/// All fully alphabetic readings of `token`.
///
/// A character is only reversed when a letter sits within two positions of
/// it. Readings compose across positions, so `p4ssw0rd` yields both
/// `password` and `pforssword`.
pub fn expand(token: &str) -> Vec<Variant> {
    let chars: Vec<char> = token.chars().collect();
    let mut alternates = vec![Variant::literal(token)];

    for (i, &c) in chars.iter().enumerate() {
        let options = replacements(c);
        if options.is_empty() || !has_letter_context(&chars, i) {
            continue;
        }
        let existing = alternates.len();
        for &(replacement, weight) in options {
            for k in 0..existing {
                let base = &alternates[k];
                let mut candidate: Vec<char> = base.candidate.chars().collect();
                let at = i + base.offset;
                if at >= candidate.len() {
                    continue;
                }
                candidate.splice(at..=at, replacement.chars());
                let next = Variant {
                    candidate: candidate.into_iter().collect(),
                    offset: base.offset + replacement.chars().count() - 1,
                    commonness: base.commonness.min(weight),
                };
                alternates.push(next);
            }
        }
    }

    alternates.retain(|v| v.candidate.chars().all(|c| c.is_ascii_alphabetic()));
    alternates
}

/// The readings worth a dictionary lookup for `token` inside a password of `password_len` chars.
///
/// Purely alphabetic tokens and long passwords get only the literal.
pub fn variants(token: &str, password_len: usize) -> Vec<Variant> {
    let has_non_alpha = token.chars().any(|c| !c.is_ascii_alphabetic());
    if has_non_alpha && password_len <= MAX_SUBSTITUTION_LENGTH {
        expand(token)
    } else {
        vec![Variant::literal(token)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(variants: &'a [Variant], candidate: &str) -> Option<&'a Variant> {
        variants.iter().find(|v| v.candidate == candidate)
    }

    #[test]
    fn test_expand_p4ssw0rd_reaches_password() {
        let variants = expand("p4ssw0rd");
        let password = find(&variants, "password").expect("password reading");
        assert!(password.commonness < LITERAL_COMMONNESS);
        assert!((password.commonness - 3.1).abs() < 1e-9);

        let pfor = find(&variants, "pforssword").expect("multi-char reading");
        assert!((pfor.commonness - 6.8).abs() < 1e-9);
        assert_eq!(pfor.offset, 2);
    }

    #[test]
    fn test_expand_drops_non_alpha_readings() {
        let variants = expand("p4ssw0rd");
        assert!(variants.iter().all(|v| v.candidate.chars().all(|c| c.is_ascii_alphabetic())));
        assert!(find(&variants, "p4ssw0rd").is_none());
    }

    #[test]
    fn test_expand_requires_letter_context() {
        // digits with no letter nearby stay digits, so nothing alphabetic remains
        assert!(expand("1000").is_empty());
        assert_eq!(find(&expand("h3llo"), "hello").map(|v| v.commonness), Some(12.4));
    }

    #[test]
    fn test_expand_plain_word_keeps_literal() {
        let variants = expand("hello");
        assert_eq!(variants, vec![Variant::literal("hello")]);
    }

    #[test]
    fn test_variants_guard_for_long_passwords() {
        let short = variants("p4ss", 8);
        assert!(find(&short, "pass").is_some());

        let long = variants("p4ss", MAX_SUBSTITUTION_LENGTH + 1);
        assert_eq!(long, vec![Variant::literal("p4ss")]);
    }
}
