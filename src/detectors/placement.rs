//! Predictable placement of uppercase letters, digits and symbols.
//!
//! Each detector scores 1 when it fires and proposes one rewrite that moves
//! or changes the predictable part. The rewrite seeds the suggestion search.

use super::{Feedback, Finding};
use rand::Rng;

/// A rewritten password with a per-character change mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub password: String,
    /// `true` where a character was inserted, moved or changed.
    pub mask: Vec<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placement {
    pub finding: Finding,
    pub correction: Option<Correction>,
}

fn fired(public: &str, sensitive: &str, reason: &str, problem: String, correction: Option<Correction>) -> Placement {
    Placement {
        finding: Finding::with_feedback(
            1,
            Feedback {
                public_text: public.to_string(),
                sensitive_text: sensitive.to_string(),
                reason_why: reason.to_string(),
                problem_text: problem,
            },
        ),
        correction,
    }
}

/// Start index of each segment when `chars` is exactly one non-empty run per predicate.
fn segments(chars: &[char], predicates: &[fn(&char) -> bool]) -> Option<Vec<usize>> {
    let mut starts = Vec::with_capacity(predicates.len());
    let mut i = 0;
    for predicate in predicates {
        let run = chars[i..].iter().take_while(|c| predicate(c)).count();
        if run == 0 {
            return None;
        }
        starts.push(i);
        i += run;
    }
    (i == chars.len()).then_some(starts)
}

fn is_digit(c: &char) -> bool {
    c.is_ascii_digit()
}

fn is_non_digit(c: &char) -> bool {
    !c.is_ascii_digit()
}

fn is_letter(c: &char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_alnum(c: &char) -> bool {
    c.is_ascii_alphanumeric()
}

fn is_symbol(c: &char) -> bool {
    !c.is_ascii_alphanumeric()
}

/// Concatenates the pieces, marking characters of the moved ones.
fn rearranged(pieces: [(&[char], bool); 3]) -> Correction {
    let mut password = String::new();
    let mut mask = Vec::new();
    for (piece, moved) in pieces {
        password.extend(piece.iter());
        mask.extend(std::iter::repeat_n(moved, piece.len()));
    }
    Correction { password, mask }
}

fn recase_one<R: Rng + ?Sized>(chars: &[char], pick: fn(&char) -> bool, upper: bool, rng: &mut R) -> Option<Correction> {
    let positions: Vec<usize> = (0..chars.len()).filter(|&i| pick(&chars[i])).collect();
    if positions.is_empty() {
        return None;
    }
    let at = positions[rng.gen_range(0..positions.len())];
    let mut fixed = chars.to_vec();
    fixed[at] = if upper {
        fixed[at].to_ascii_uppercase()
    } else {
        fixed[at].to_ascii_lowercase()
    };
    let mut mask = vec![false; chars.len()];
    mask[at] = true;
    Some(Correction {
        password: fixed.into_iter().collect(),
        mask,
    })
}

/// Only the first letter capitalized, or everything capitalized.
pub fn uppercase_predictable<R: Rng + ?Sized>(password: &str, rng: &mut R) -> Placement {
    let chars: Vec<char> = password.chars().collect();
    let Some(first) = chars.first() else {
        return Placement::default();
    };

    if first.is_ascii_uppercase() && !chars[1..].iter().any(char::is_ascii_uppercase) {
        return fired(
            "Capitalize a letter in the middle",
            "Capitalize a letter in the middle, rather than the first character",
            "30% of people also capitalize only the first character",
            first.to_string(),
            recase_one(&chars, char::is_ascii_lowercase, true, rng),
        );
    }

    let uppercase = chars.iter().filter(|c| c.is_ascii_uppercase()).count();
    if !chars.iter().any(char::is_ascii_lowercase) && uppercase >= 3 {
        return fired(
            "Mix up your capitalization",
            "Mix up your capitalization, rather than capitalizing everything",
            "21% of passwords also contain only uppercase letters",
            String::new(),
            recase_one(&chars, char::is_ascii_uppercase, false, rng),
        );
    }
    Placement::default()
}

/// Digits only, digits only at the start, or digits only at the end.
pub fn digits_predictable<R: Rng + ?Sized>(password: &str, rng: &mut R) -> Placement {
    let chars: Vec<char> = password.chars().collect();
    let len = chars.len();
    if len < 4 {
        return Placement::default();
    }

    if chars.iter().all(is_digit) {
        let at = rng.gen_range(1..len);
        let inserted = char::from(rng.gen_range(58u8..126));
        let mut fixed = chars.clone();
        fixed.insert(at, inserted);
        let mut mask = vec![false; len + 1];
        mask[at] = true;
        return fired(
            "Add more letters and symbols to your password",
            "Add characters other than digits to your password",
            "35% of people also use only digits",
            password.to_string(),
            Some(Correction {
                password: fixed.into_iter().collect(),
                mask,
            }),
        );
    }

    if let Some(starts) = segments(&chars, &[is_digit, is_non_digit]) {
        let first_non_digit = starts[1];
        let loc = if len > first_non_digit + 1 {
            rng.gen_range(first_non_digit + 1..len)
        } else {
            len
        };
        let correction = rearranged([
            (&chars[first_non_digit..loc], false),
            (&chars[..first_non_digit], true),
            (&chars[loc..], false),
        ]);
        return fired(
            "Consider inserting digits into the middle",
            "Consider inserting digits into the middle, not just at the beginning",
            "10% of people also put digits at the beginning of the password",
            chars[..first_non_digit].iter().collect(),
            Some(correction),
        );
    }

    if let Some(starts) = segments(&chars, &[is_non_digit, is_digit]) {
        let digits_start = starts[1];
        let correction = (digits_start >= 2).then(|| {
            let loc = rng.gen_range(1..digits_start);
            rearranged([
                (&chars[..loc], false),
                (&chars[digits_start..], true),
                (&chars[loc..digits_start], false),
            ])
        });
        return fired(
            "Consider inserting digits into the middle",
            "Consider inserting digits into the middle, not just at the end",
            "38% of people also put digits at the end of the password",
            chars[digits_start..].iter().collect(),
            correction,
        );
    }
    Placement::default()
}

/// Letters then symbols then digits, or symbols only at the end.
pub fn symbols_predictable<R: Rng + ?Sized>(password: &str, rng: &mut R) -> Placement {
    let chars: Vec<char> = password.chars().collect();
    if chars.len() < 4 {
        return Placement::default();
    }

    let (symbols_start, sensitive, reason) =
        if let Some(starts) = segments(&chars, &[is_letter, is_symbol, is_digit]) {
            (
                starts[1],
                "Move symbols and digits earlier, rather than just at the end",
                "14% of people also use letters, followed by symbols, followed by digits",
            )
        } else if let Some(starts) = segments(&chars, &[is_alnum, is_symbol]) {
            (
                starts[1],
                "Move your symbols earlier, rather than just at the end",
                "16% of people also put symbols only at the end of the password",
            )
        } else {
            return Placement::default();
        };

    let correction = (symbols_start >= 2).then(|| {
        let loc = rng.gen_range(1..symbols_start);
        rearranged([
            (&chars[..loc], false),
            (&chars[symbols_start..], true),
            (&chars[loc..symbols_start], false),
        ])
    });
    fired(
        "Move symbols and digits elsewhere in your password",
        sensitive,
        reason,
        chars[symbols_start..].iter().collect(),
        correction,
    )
}
