//! Password meter library
//!
//! Checks passwords against a configurable composition policy, estimates
//! how guessable they are and proposes stronger compliant variants.
//!
//! A rating combines a heuristic score built from pattern detectors and
//! word lists with an optional external guess-number oracle, and an
//! optional k-anonymity leak lookup. Both external calls run in the
//! background; [`PasswordMeter`] picks their answers up as they arrive.
//!
//! # Features
//!
//! - `hibp` (default): Enables leak lookups against the Pwned Passwords range API
//! - `tracing`: Enables logging via tracing crate
//!
//! # Environment Variables
//!
//! - `PWD_BLACKLIST_PATH`: Custom path to blacklist file when the policy
//!   names none (default: `./assets/blacklist.txt`)
//!
//! # Example
//!
//! ```rust,no_run
//! use pwd_meter::{Config, PasswordMeter};
//! use secrecy::SecretString;
//!
//! # async fn demo() -> Result<(), pwd_meter::MeterError> {
//! let mut meter = PasswordMeter::builder(Config::default()).build()?;
//!
//! let password = SecretString::new("MyP@ssw0rd!".to_string().into());
//! let rating = meter.rate(&password, "alice");
//! println!("Compliant: {}", rating.compliance.compliant);
//!
//! // wait for the oracle and leak lookups, then look again
//! if let Some(rating) = meter.settle().await {
//!     println!("{} ({:.0})", rating.headline, rating.score());
//! }
//! # Ok(())
//! # }
//! ```

mod blacklist;
mod bloom;
mod config;
mod detectors;
mod dictionary;
mod heuristic;
mod leak;
mod meter;
mod oracle;
mod policy;
mod substitution;
mod suggestion;
mod synthesizer;
mod text;

// Public API
pub use blacklist::{BlacklistError, BlacklistIndex, resolve_blacklist_path};
pub use config::{
    BlacklistPolicy, ClassCountPolicy, ClassSwitches, Config, ForbidCharsPolicy,
    GuessThresholdPolicy, LeakPolicy, LengthPolicy, LimitPolicy, SameCharsPolicy,
};
pub use detectors::{Correction, Feedback};
pub use dictionary::{Category, Dictionaries, DictionaryError};
pub use heuristic::{HeuristicResult, HeuristicScorer};
pub use leak::{LeakError, LeakService, LeakState, RangeClient, RangeFuture};
pub use meter::{MeterError, MeterEvent, PasswordMeter, PasswordMeterBuilder, Rating, headline};
pub use oracle::{GuessFuture, GuessOracle, OracleMode};
pub use policy::{ComplianceDetail, ComplianceResult, CompositionPolicyEngine, Dimension};
pub use suggestion::SuggestionCandidate;
pub use synthesizer::{GuessCache, GuessEstimate, ScoreEstimate};

#[cfg(feature = "hibp")]
pub use leak::HttpRangeClient;
