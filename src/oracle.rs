//! Guess-number oracle contract and post-processing.
//!
//! The oracle itself lives outside this crate. It answers with a raw guess
//! number, which is corrected for capitalization, taken to log10 and mapped
//! onto the 0-100 scale the same way heuristic scores are.

use std::future::Future;
use std::pin::Pin;

/// Which password an estimate is for. Each mode has its own oracle client
/// and its own cache so suggestion work never disturbs the displayed score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OracleMode {
    /// The password being typed.
    Primary,
    /// A suggestion candidate.
    Candidate,
}

pub type GuessFuture = Pin<Box<dyn Future<Output = f64> + Send>>;

/// Asynchronous guess-number estimator.
///
/// The answer may be 0 or negative, `+inf` for trivial input, or NaN when
/// the estimator failed.
pub trait GuessOracle: Send + Sync {
    fn estimate(&self, password: &str, mode: OracleMode) -> GuessFuture;
}

/// Multiplier for how predictably the password uses uppercase letters.
pub fn uppercase_penalty(password: &str) -> f64 {
    let mut chars = password.chars();
    let Some(first) = chars.next() else {
        return 1.0;
    };
    let rest = chars.as_str();

    if first.is_uppercase() && !rest.chars().any(char::is_uppercase) {
        return 1.5;
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        let uppercase = password.chars().filter(|c| c.is_uppercase()).count();
        return if uppercase >= 3 { 2.0 } else { 1.0 };
    }
    if password.chars().any(char::is_uppercase) {
        return 10.0;
    }
    1.0
}

/// log10 of the capitalization-corrected guess number.
///
/// NaN stays NaN. Anything at or below one guess reads as 1.1 guesses.
pub fn log_guess_number(raw: f64, password: &str) -> f64 {
    if raw.is_nan() {
        return f64::NAN;
    }
    let corrected = raw * uppercase_penalty(password);
    if corrected <= 1.0 {
        1.1f64.log10()
    } else if corrected == f64::INFINITY {
        f64::INFINITY
    } else {
        corrected.log10()
    }
}

/// Clamps a meter value to `[len/2, 100]`; the floor shows progress for any non-empty password.
pub fn meter_clamp(value: f64, password_len: usize) -> f64 {
    value.max(password_len as f64 / 2.0).min(100.0)
}

/// Maps a log10 guess number onto the meter, clamped to `[len/2, 100]`.
///
/// `None` for NaN. Infinity fills the meter for a non-empty password.
pub fn oracle_score(log_guesses: f64, password_len: usize, scale: f64) -> Option<f64> {
    if log_guesses.is_nan() {
        return None;
    }
    if log_guesses == f64::INFINITY {
        return Some(if password_len > 0 { 100.0 } else { 0.0 });
    }
    Some(meter_clamp(log_guesses * scale, password_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uppercase_penalty() {
        assert_eq!(uppercase_penalty("password"), 1.0);
        assert_eq!(uppercase_penalty("Password1"), 1.5);
        assert_eq!(uppercase_penalty("PASSWORD1"), 2.0);
        assert_eq!(uppercase_penalty("AB12"), 1.0);
        assert_eq!(uppercase_penalty("passWord"), 10.0);
        assert_eq!(uppercase_penalty(""), 1.0);
    }

    #[test]
    fn test_log_guess_number() {
        assert!(log_guess_number(f64::NAN, "x").is_nan());
        assert!((log_guess_number(1000.0, "password") - 3.0).abs() < 1e-9);
        // first-letter capital costs a factor of 1.5
        assert!((log_guess_number(1000.0, "Password") - 1500f64.log10()).abs() < 1e-9);
        assert!((log_guess_number(-4.0, "abc") - 1.1f64.log10()).abs() < 1e-12);
        assert_eq!(log_guess_number(f64::INFINITY, "abc"), f64::INFINITY);
    }

    #[test]
    fn test_oracle_score_clamps() {
        let scale = 67.0 / 15.0;
        assert_eq!(oracle_score(f64::NAN, 8, scale), None);
        assert_eq!(oracle_score(f64::INFINITY, 8, scale), Some(100.0));
        assert_eq!(oracle_score(f64::INFINITY, 0, scale), Some(0.0));
        assert_eq!(oracle_score(40.0, 8, scale), Some(100.0));
        // floor at half the length
        assert_eq!(oracle_score(0.0, 12, scale), Some(6.0));
        let mid = oracle_score(15.0, 8, scale).unwrap();
        assert!((mid - 67.0).abs() < 1e-9);
    }

    #[test]
    fn test_meter_clamp() {
        assert_eq!(meter_clamp(-3.0, 10), 5.0);
        assert_eq!(meter_clamp(250.0, 10), 100.0);
        assert_eq!(meter_clamp(50.0, 400), 100.0);
    }

    #[test]
    fn test_oracle_score_monotonic_in_scale() {
        let low = oracle_score(5.0, 10, 2.0).unwrap();
        let high = oracle_score(5.0, 10, 4.0).unwrap();
        assert!(high >= low);
    }
}
