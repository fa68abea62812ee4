//! Character-class structure ("skeleton") predictability.

use super::{CharClass, Feedback, Finding};
use std::collections::HashMap;
use std::sync::LazyLock;

const STRUCTURES: &str = include_str!("../../assets/structures.txt");

/// Common skeletons, most common first.
static STRUCTURE_RANKS: LazyLock<HashMap<&'static str, usize>> = LazyLock::new(|| {
    STRUCTURES
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .enumerate()
        .map(|(rank, skeleton)| (skeleton, rank))
        .collect()
});

/// Size of the skeleton table.
pub static STRUCTURE_COUNT: LazyLock<usize> = LazyLock::new(|| STRUCTURE_RANKS.len());

fn symbol(class: CharClass) -> char {
    match class {
        CharClass::Upper => 'U',
        CharClass::Lower => 'L',
        CharClass::Digit => 'D',
        CharClass::Symbol => 'S',
    }
}

/// Maps each character to U, L, D or S.
pub fn skeleton(password: &str) -> String {
    password.chars().map(|c| symbol(CharClass::of(c))).collect()
}

fn describe(skeleton: &str) -> String {
    let chars: Vec<char> = skeleton.chars().collect();
    let mut runs = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let run = chars[i..].iter().take_while(|&&c| c == chars[i]).count();
        let name = match chars[i] {
            'U' => "uppercase letter",
            'L' => "lowercase letter",
            'D' => "digit",
            _ => "symbol",
        };
        let plural = if run > 1 { "s" } else { "" };
        runs.push(format!("{} {}{}", run, name, plural));
        i += run;
    }
    runs.join(", ")
}

/// Scores how common the password's skeleton is: table size minus rank, or 0 when absent.
pub fn structure_predictable(password: &str) -> Finding {
    let skeleton = skeleton(password);
    let Some(&rank) = STRUCTURE_RANKS.get(skeleton.as_str()) else {
        return Finding::quiet(0);
    };
    let public = "The way you structure your password is predictable";
    Finding::with_feedback(
        *STRUCTURE_COUNT - rank,
        Feedback {
            public_text: public.to_string(),
            sensitive_text: format!("{} ({})", public, describe(&skeleton)),
            reason_why: "One technique attackers use is to try all possible passwords within common structures, or arrangements of character classes (e.g., where lowercase letters and digits are located)".to_string(),
            problem_text: String::new(),
        },
    )
}
