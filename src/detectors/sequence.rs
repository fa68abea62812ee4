//! Alphabetic and numeric sequences such as `abcd`, `9753` or `aceg`.

use super::{Feedback, Finding, longest_delta_run, quote};

/// Length of the longest run with a constant, non-zero code-point step.
///
/// Runs of three or more characters score their length; feedback starts at four.
pub fn alphabetic_sequence(password: &str) -> Finding {
    let chars: Vec<char> = password.chars().collect();
    let deltas: Vec<i64> = chars
        .windows(2)
        .map(|w| w[1] as i64 - w[0] as i64)
        .collect();

    let Some((start, run)) = longest_delta_run(&deltas, &0) else {
        return Finding::quiet(0);
    };
    if run < 2 {
        return Finding::quiet(0);
    }
    let score = run + 1;
    if score < 4 {
        return Finding::quiet(score);
    }

    let sequence: String = chars[start..start + score].iter().collect();
    let kind = if sequence.chars().all(|c| c.is_ascii_digit()) {
        "numerical patterns"
    } else {
        "patterns from the alphabet"
    };
    Finding::with_feedback(
        score,
        Feedback {
            public_text: format!("Avoid {}", kind),
            sensitive_text: format!("Avoid {} like {}", kind, quote(&sequence)),
            reason_why: "Attackers know to guess sequences following the alphabet, in addition to repeated characters or patterns on your keyboard".to_string(),
            problem_text: sequence,
        },
    )
}
