//! Character-class census: length, per-class counts and class variety.

use super::{Feedback, Finding};
use crate::config::ClassSwitches;
use crate::text::human_join;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    Upper,
    Lower,
    Digit,
    Symbol,
}

impl CharClass {
    pub fn of(c: char) -> Self {
        if c.is_ascii_uppercase() {
            Self::Upper
        } else if c.is_ascii_lowercase() {
            Self::Lower
        } else if c.is_ascii_digit() {
            Self::Digit
        } else {
            Self::Symbol
        }
    }

    pub fn plural_name(self) -> &'static str {
        match self {
            Self::Upper => "uppercase letters",
            Self::Lower => "lowercase letters",
            Self::Digit => "digits",
            Self::Symbol => "symbols",
        }
    }

    /// Whether `switches` enables this class.
    pub fn enabled_in(self, switches: &ClassSwitches) -> bool {
        match self {
            Self::Upper => switches.upper_case,
            Self::Lower => switches.lower_case,
            Self::Digit => switches.digits,
            Self::Symbol => switches.symbols,
        }
    }

    /// Permitted unless an active allow-list switches it off.
    pub fn permitted_by(self, allow: &ClassSwitches) -> bool {
        !allow.active || self.enabled_in(allow)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassCensus {
    pub upper: usize,
    pub lower: usize,
    pub digits: usize,
    pub symbols: usize,
}

impl ClassCensus {
    pub fn of(password: &str) -> Self {
        let mut census = Self::default();
        for c in password.chars() {
            match CharClass::of(c) {
                CharClass::Upper => census.upper += 1,
                CharClass::Lower => census.lower += 1,
                CharClass::Digit => census.digits += 1,
                CharClass::Symbol => census.symbols += 1,
            }
        }
        census
    }

    pub fn count(&self, class: CharClass) -> usize {
        match class {
            CharClass::Upper => self.upper,
            CharClass::Lower => self.lower,
            CharClass::Digit => self.digits,
            CharClass::Symbol => self.symbols,
        }
    }

    pub fn has(&self, class: CharClass) -> bool {
        self.count(class) > 0
    }

    /// Number of distinct classes present.
    pub fn classes(&self) -> usize {
        [CharClass::Upper, CharClass::Lower, CharClass::Digit, CharClass::Symbol]
            .into_iter()
            .filter(|&c| self.has(c))
            .count()
    }
}

/// Length sub-score, with advice for anything under 16 characters.
///
/// No advice is given when a configured maximum is within reach.
pub fn length_feedback(length: usize, max_length: usize) -> Finding {
    let room_to_grow = max_length == 0 || length + 3 < max_length;
    if length >= 16 || !room_to_grow {
        return Finding::quiet(length);
    }
    let (public, sensitive, reason) = if length < 10 {
        (
            "Make your password longer",
            "Make your password longer than",
            "Attackers are very good at guessing passwords under 10 characters even if the passwords look random",
        )
    } else if length <= 12 {
        (
            "Make your password longer",
            "Make your password longer than",
            "Attackers are very good at guessing passwords containing 12 characters or fewer",
        )
    } else {
        (
            "Consider making your password longer",
            "Consider making your password longer than",
            "In recent years, attackers have gotten much better at guessing passwords under 16 characters",
        )
    };
    Finding::with_feedback(
        length,
        Feedback {
            public_text: public.to_string(),
            sensitive_text: format!("{} {} characters", sensitive, length),
            reason_why: reason.to_string(),
            problem_text: String::new(),
        },
    )
}

/// Count of one class; suggests more when it is under 15% of the password.
pub fn count_class(password: &str, class: CharClass, permitted: bool) -> Finding {
    let count = ClassCensus::of(password).count(class);
    let length = password.chars().count();
    if !permitted || (count as f64) >= 0.15 * length as f64 {
        return Finding::quiet(count);
    }
    let reason = match class {
        CharClass::Upper => "Uppercase letters are surprisingly uncommon in passwords, which makes them hard to guess",
        CharClass::Lower => "Having variety in the types of characters you use makes your password harder to guess",
        CharClass::Digit => {
            "Most passwords contain no digits or digits in predictable places; doing otherwise makes your password harder to guess"
        }
        CharClass::Symbol => "Few passwords contain symbols, which makes passwords with symbols harder to guess",
    };
    Finding::with_feedback(
        count,
        Feedback {
            public_text: format!("Consider using more {}", class.plural_name()),
            sensitive_text: format!("Consider using {} or more {}", count + 1, class.plural_name()),
            reason_why: reason.to_string(),
            problem_text: String::new(),
        },
    )
}

/// Number of classes used, with advice for the common low-variety shapes.
pub fn character_classes(password: &str, allow: &ClassSwitches) -> Finding {
    let census = ClassCensus::of(password);
    let classes = census.classes();
    if password.is_empty() {
        return Finding::quiet(classes);
    }

    let suggest = |candidates: &[CharClass], reason: &str| -> Finding {
        let allowed: Vec<&str> = candidates
            .iter()
            .filter(|c| c.permitted_by(allow))
            .map(|c| c.plural_name())
            .collect();
        if allowed.is_empty() {
            return Finding::quiet(classes);
        }
        let text = format!("Add {} in unpredictable locations", human_join(&allowed));
        Finding::with_feedback(
            classes,
            Feedback {
                public_text: text.clone(),
                sensitive_text: text,
                reason_why: reason.to_string(),
                problem_text: String::new(),
            },
        )
    };

    let (upper, digits, symbols) = (
        census.has(CharClass::Upper),
        census.has(CharClass::Digit),
        census.has(CharClass::Symbol),
    );
    if !upper && !digits && !symbols {
        suggest(
            &[CharClass::Symbol, CharClass::Digit, CharClass::Upper],
            "38% of passwords contain only lowercase letters, making them easy for attackers to guess",
        )
    } else if !digits && !symbols {
        suggest(
            &[CharClass::Symbol, CharClass::Digit],
            "42% of passwords contain only letters, making them easy for attackers to guess",
        )
    } else if !upper && !symbols {
        suggest(
            &[CharClass::Symbol, CharClass::Upper],
            "42% of passwords contain only lowercase letters and numbers, making them easy for attackers to guess",
        )
    } else if !symbols {
        suggest(
            &[CharClass::Symbol],
            "Because only 1% of passwords use symbols, adding them unpredictably strengthens your password",
        )
    } else {
        Finding::quiet(classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_census_counts() {
        let census = ClassCensus::of("Ab1!é");
        assert_eq!(census, ClassCensus { upper: 1, lower: 1, digits: 1, symbols: 2 });
        assert_eq!(census.classes(), 4);
        assert_eq!(ClassCensus::of("").classes(), 0);
    }

    #[test]
    fn test_length_feedback_thresholds() {
        let short = length_feedback(8, 0);
        assert_eq!(short.score, 8);
        assert!(short.feedback.unwrap().reason_why.contains("under 10"));

        let medium = length_feedback(12, 0).feedback.unwrap();
        assert!(medium.reason_why.contains("12 characters or fewer"));

        let long = length_feedback(14, 0).feedback.unwrap();
        assert_eq!(long.public_text, "Consider making your password longer");

        assert!(length_feedback(16, 0).feedback.is_none());
        // already near the configured maximum
        assert!(length_feedback(10, 12).feedback.is_none());
    }

    #[test]
    fn test_count_class_suggests_more() {
        let finding = count_class("password1", CharClass::Upper, true);
        assert_eq!(finding.score, 0);
        let feedback = finding.feedback.unwrap();
        assert_eq!(feedback.sensitive_text, "Consider using 1 or more uppercase letters");

        assert!(count_class("password1", CharClass::Upper, false).feedback.is_none());
        assert!(count_class("PASSword", CharClass::Upper, true).feedback.is_none());
    }

    #[test]
    fn test_character_classes_cases() {
        let allow = ClassSwitches::default();

        let lower_only = character_classes("password", &allow);
        assert_eq!(lower_only.score, 1);
        assert_eq!(
            lower_only.feedback.unwrap().public_text,
            "Add symbols, digits and uppercase letters in unpredictable locations"
        );

        let letters = character_classes("Password", &allow).feedback.unwrap();
        assert_eq!(letters.public_text, "Add symbols and digits in unpredictable locations");

        let no_symbols = character_classes("Password1", &allow).feedback.unwrap();
        assert_eq!(no_symbols.public_text, "Add symbols in unpredictable locations");

        assert!(character_classes("Pass word1", &allow).feedback.is_none());
    }

    #[test]
    fn test_character_classes_respects_allow_list() {
        let allow = ClassSwitches {
            active: true,
            upper_case: false,
            lower_case: true,
            digits: true,
            symbols: false,
        };
        let feedback = character_classes("password", &allow).feedback.unwrap();
        assert_eq!(feedback.public_text, "Add digits in unpredictable locations");
        assert!(character_classes("password1", &allow).feedback.is_none());
    }
}
