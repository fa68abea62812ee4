//! Keyboard-walk detection on a US QWERTY layout.

use super::{Feedback, Finding, longest_delta_run, quote};

/// (row, column) of each key; shifted symbols share their key's position.
fn key_position(c: char) -> Option<(i32, i32)> {
    let pos = match c {
        '`' | '~' => (0, 0),
        '1' | '!' => (0, 1),
        '2' | '@' => (0, 2),
        '3' | '#' => (0, 3),
        '4' | '$' => (0, 4),
        '5' | '%' => (0, 5),
        '6' | '^' => (0, 6),
        '7' | '&' => (0, 7),
        '8' | '*' => (0, 8),
        '9' | '(' => (0, 9),
        '0' | ')' => (0, 10),
        '-' | '_' => (0, 11),
        '=' | '+' => (0, 12),
        'q' => (1, 1),
        'w' => (1, 2),
        'e' => (1, 3),
        'r' => (1, 4),
        't' => (1, 5),
        'y' => (1, 6),
        'u' => (1, 7),
        'i' => (1, 8),
        'o' => (1, 9),
        'p' => (1, 10),
        '[' | '{' => (1, 11),
        ']' | '}' => (1, 12),
        '\\' | '|' => (1, 13),
        'a' => (2, 1),
        's' => (2, 2),
        'd' => (2, 3),
        'f' => (2, 4),
        'g' => (2, 5),
        'h' => (2, 6),
        'j' => (2, 7),
        'k' => (2, 8),
        'l' => (2, 9),
        ';' | ':' => (2, 10),
        '\'' | '"' => (2, 11),
        'z' => (3, 1),
        'x' => (3, 2),
        'c' => (3, 3),
        'v' => (3, 4),
        'b' => (3, 5),
        'n' => (3, 6),
        'm' => (3, 7),
        ',' | '<' => (3, 8),
        '.' | '>' => (3, 9),
        '/' | '?' => (3, 10),
        _ => return None,
    };
    Some(pos)
}

/// Length of the longest straight-line keyboard walk.
///
/// Characters with no known key are skipped. Walks of fewer than three keys
/// score 0; four or more produce feedback.
pub fn keyboard_patterns(password: &str) -> Finding {
    let keys: Vec<(char, (i32, i32))> = password
        .to_lowercase()
        .chars()
        .filter_map(|c| key_position(c).map(|p| (c, p)))
        .collect();

    let deltas: Vec<(i32, i32)> = keys
        .windows(2)
        .map(|w| {
            let ((_, (r0, c0)), (_, (r1, c1))) = (w[0], w[1]);
            (r1 - r0, c1 - c0)
        })
        .collect();

    let Some((start, run)) = longest_delta_run(&deltas, &(0, 0)) else {
        return Finding::quiet(0);
    };
    let score = run + 1;
    if score < 3 {
        return Finding::quiet(0);
    }
    if score < 4 {
        return Finding::quiet(score);
    }

    let walk: String = keys[start..start + score].iter().map(|(c, _)| *c).collect();
    Finding::with_feedback(
        score,
        Feedback {
            public_text: "Avoid using a pattern on your keyboard".to_string(),
            sensitive_text: format!("Avoid using a pattern on your keyboard like {}", quote(&walk)),
            reason_why: "Because keyboard patterns are very common in passwords, attackers know to guess them"
                .to_string(),
            problem_text: walk,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_qwerty123() {
        let finding = keyboard_patterns("qwerty123");
        assert!(finding.score >= 6, "got {}", finding.score);
        let feedback = finding.feedback.expect("walk reported");
        assert_eq!(feedback.problem_text, "qwerty");
    }

    #[test]
    fn test_keyboard_diagonal_and_case() {
        // q-a-z runs straight down the left edge
        assert_eq!(keyboard_patterns("xQAZx").score, 3);
        assert!(keyboard_patterns("xQAZx").feedback.is_none());
        assert_eq!(keyboard_patterns("ASDFG").score, 5);
    }

    #[test]
    fn test_keyboard_short_walks_score_zero() {
        assert_eq!(keyboard_patterns("qw").score, 0);
        assert_eq!(keyboard_patterns("").score, 0);
        assert_eq!(keyboard_patterns("aaaa").score, 0);
        assert_eq!(keyboard_patterns("qpzm").score, 0);
    }
}
