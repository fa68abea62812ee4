//! Word lists and the dictionary matcher.
//!
//! Categories are kept disjoint: a word belongs to the first category it
//! was loaded into. General dictionaries only hold lowercase words of at
//! least four characters.

use crate::detectors::{Feedback, quote_all};
use crate::substitution::{LITERAL_COMMONNESS, variants};
use crate::text::{char_len, human_join, split_out, substrings_min_max};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Shortest word kept in a dictionary.
pub const MIN_WORD_LENGTH: usize = 4;

#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("Dictionary file not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Failed to read dictionary file: {0}")]
    ReadError(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Names,
    PetNames,
    Phrases,
    EnglishWords,
    Wikipedia,
    /// Common passwords; used for the common-password check, not word matching.
    Passwords,
}

impl Category {
    /// Lookup order when matching words.
    pub const MATCH_ORDER: [Category; 5] = [
        Category::PetNames,
        Category::Phrases,
        Category::Names,
        Category::Wikipedia,
        Category::EnglishWords,
    ];

    /// Order in which matched words are reported.
    const REPORT_ORDER: [Category; 5] = [
        Category::Names,
        Category::PetNames,
        Category::Phrases,
        Category::EnglishWords,
        Category::Wikipedia,
    ];

    fn complaint(self) -> &'static str {
        match self {
            Category::Names => "names",
            Category::PetNames => "pet names",
            Category::Phrases => "common phrases",
            Category::EnglishWords => "dictionary words",
            Category::Wikipedia => "words used on Wikipedia",
            Category::Passwords => "common passwords",
        }
    }
}

const PET_NAMES: &[&str] = &[
    "abbey", "abby", "alex", "allie", "amber", "angel", "annie", "ashley", "baby", "bailey",
    "bandit", "barney", "baxter", "bear", "beau", "bella", "belle", "bentley", "blackie", "blue",
    "bonnie", "boomer", "boots", "bosco", "brady", "brandy", "bruno", "brutus", "bubba", "buddy",
    "buffy", "buster", "cali", "callie", "calvin", "casey", "casper", "cassie", "champ", "chance",
    "charlie", "chase", "chelsea", "chester", "chico", "chloe", "cleo", "cleopatra", "clyde",
    "coco", "cocoa", "cody", "cookie", "cooper", "cosmo", "daisy", "dakota", "dexter", "diesel",
    "dixie", "duke", "duncan", "dusty", "ella", "ellie", "elvis", "emily", "emma", "felix",
    "fiona", "fluffy", "frankie", "fred", "gabriel", "garfield", "george", "gigi", "ginger",
    "gizmo", "grace", "gracie", "guinness", "haley", "hannah", "harley", "harry", "heidi",
    "henry", "holly", "honey", "hunter", "isabella", "isis", "jack", "jackson", "jade", "jake",
    "jasmine", "jasper", "jessie", "joey", "junior", "katie", "kiki", "kitty", "kobe", "lacey",
    "lady", "lexi", "lexie", "libby", "lilly", "lily", "loki", "lola", "louie", "lucky", "lucy",
    "luke", "lulu", "luna", "maddie", "madison", "maggie", "mandy", "marley", "maximus",
    "maxwell", "maya", "merlin", "mickey", "midnight", "mikey", "millie", "milo", "mimi",
    "minnie", "misskitty", "missy", "misty", "mittens", "mocha", "molly", "moose", "morgan",
    "muffin", "murphy", "nala", "nikki", "oliver", "olivia", "oreo", "oscar", "otis", "patches",
    "peaches", "peanut", "pebbles", "penny", "pepper", "phoebe", "piper", "precious", "prince",
    "princess", "pumpkin", "rascal", "riley", "rocco", "rocky", "romeo", "roscoe", "rosie",
    "roxie", "roxy", "ruby", "rudy", "rufus", "rusty", "sabrina", "sadie", "samantha", "sammy",
    "sampson", "samson", "sandy", "sarah", "sasha", "sassy", "scooter", "scout", "sebastian",
    "shadow", "sheba", "shelby", "sierra", "simba", "simon", "smokey", "snoopy", "snowball",
    "socks", "sonny", "sophia", "sophie", "sparky", "spencer", "spike", "stalla", "stella",
    "sugar", "sunny", "sydney", "sylvester", "tabitha", "tasha", "teddy", "thomas", "tiger",
    "tigger", "tinkerbell", "toby", "tommy", "trixie", "tucker", "tyson", "willie", "willow",
    "winston", "xena", "yoda", "zeus", "ziggy", "zoey",
];

/// Category word sets for one session.
#[derive(Debug, Clone, Default)]
pub struct Dictionaries {
    sets: HashMap<Category, HashSet<String>>,
}

impl Dictionaries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dictionaries holding only the built-in pet-name list.
    pub fn with_builtin_pet_names() -> Self {
        let mut dictionaries = Self::new();
        dictionaries.insert(Category::PetNames, PET_NAMES.iter().copied());
        dictionaries
    }

    /// Adds words to `category`, returning how many were kept.
    ///
    /// Words are trimmed and lowercased. Short words and words already held
    /// by another category are skipped.
    pub fn insert<I, S>(&mut self, category: Category, words: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut kept = 0;
        for word in words {
            let word = word.as_ref().trim().to_lowercase();
            if char_len(&word) < MIN_WORD_LENGTH {
                continue;
            }
            let taken = self
                .sets
                .iter()
                .any(|(other, set)| *other != category && set.contains(&word));
            if taken {
                continue;
            }
            if self.sets.entry(category).or_default().insert(word) {
                kept += 1;
            }
        }
        kept
    }

    /// Loads a newline-delimited word list into `category`.
    ///
    /// An empty file is not an error; it just adds nothing.
    pub fn load_category_from_path<P: AsRef<Path>>(
        &mut self,
        category: Category,
        path: P,
    ) -> Result<usize, DictionaryError> {
        let path = path.as_ref();
        if !path.exists() {
            #[cfg(feature = "tracing")]
            tracing::error!("Dictionary load FAILED: FileNotFound {:?}", path);
            return Err(DictionaryError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let kept = self.insert(category, content.lines());

        #[cfg(feature = "tracing")]
        tracing::info!("Dictionary loaded: {} words into {:?} from {:?}", kept, category, path);

        Ok(kept)
    }

    pub fn contains(&self, category: Category, word: &str) -> bool {
        self.sets.get(&category).is_some_and(|set| set.contains(word))
    }

    /// First category in match order holding `word`.
    pub fn category_of(&self, word: &str) -> Option<Category> {
        Category::MATCH_ORDER
            .into_iter()
            .find(|&category| self.contains(category, word))
    }

    pub fn len(&self, category: Category) -> usize {
        self.sets.get(&category).map_or(0, HashSet::len)
    }
}

/// A token found by [`greedy_token_scan`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TokenHit<T> {
    /// Text as it appears in the password.
    pub token: String,
    /// The reading that matched.
    pub variant: String,
    pub commonness: f64,
    pub tag: T,
}

/// Longest-match-first scan over password parts.
///
/// Each hit is cut out of its part, the candidate list is rebuilt from the
/// shortened parts (capped at the hit's length) and the scan restarts.
pub(crate) fn greedy_token_scan<T>(
    mut parts: Vec<String>,
    min_len: usize,
    password_len: usize,
    mut lookup: impl FnMut(&str) -> Option<T>,
) -> Vec<TokenHit<T>> {
    let mut hits = Vec::new();
    let mut candidates = substrings_min_max(&parts, min_len, None);
    let mut i = 0;
    while i < candidates.len() {
        let lowered = candidates[i].to_lowercase();
        let hit = variants(&lowered, password_len)
            .into_iter()
            .find_map(|v| lookup(&v.candidate).map(|tag| (v, tag)));
        let Some((variant, tag)) = hit else {
            i += 1;
            continue;
        };

        let token = candidates[i].clone();
        if let Some(pos) = parts.iter().position(|p| p.contains(token.as_str())) {
            let pieces = split_out(&parts[pos], &token).unwrap_or_default();
            parts.splice(pos..=pos, pieces);
        }
        candidates = substrings_min_max(&parts, min_len, Some(char_len(&token)));
        hits.push(TokenHit {
            token,
            variant: variant.candidate,
            commonness: variant.commonness,
            tag,
        });
        i = 0;
    }
    hits
}

/// Word tokens found in a password.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DictionaryMatch {
    /// Literal hits, in the order found.
    pub words: Vec<(Category, String)>,
    /// Substituted hits shown as `variant → token`.
    pub transformations: Vec<String>,
    /// Characters covered by all hits.
    pub length: usize,
    pub tokens: usize,
    /// `100 - lowest commonness`; 0 when no substitution was needed.
    pub uncommonness: f64,
    pub feedback: Option<Feedback>,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '0'..='5' | '!' | '&' | '@' | '$')
}

/// Finds dictionary words in `password`, including leetspeak spellings.
pub fn match_words(password: &str, dictionaries: &Dictionaries) -> DictionaryMatch {
    let stripped: String = password.chars().filter(|c| !matches!(c, '-' | '_' | ' ')).collect();
    let parts: Vec<String> = stripped
        .split(|c: char| !is_word_char(c))
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    let hits = greedy_token_scan(parts, MIN_WORD_LENGTH, char_len(&stripped), |variant| {
        dictionaries.category_of(variant)
    });

    let mut result = DictionaryMatch::default();
    let mut transformed_tokens = Vec::new();
    let mut min_commonness = LITERAL_COMMONNESS;
    for hit in &hits {
        result.length += char_len(&hit.token);
        result.tokens += 1;
        min_commonness = min_commonness.min(hit.commonness);
        if hit.commonness >= LITERAL_COMMONNESS {
            result.words.push((hit.tag, hit.token.clone()));
        } else {
            result.transformations.push(format!("{} → {}", hit.variant, hit.token));
            transformed_tokens.push(hit.token.clone());
        }
    }
    result.uncommonness = LITERAL_COMMONNESS - min_commonness;

    let mut public = Vec::new();
    let mut sensitive = Vec::new();
    for category in Category::REPORT_ORDER {
        let words: Vec<&str> = result
            .words
            .iter()
            .filter(|(c, _)| *c == category)
            .map(|(_, w)| w.as_str())
            .collect();
        if !words.is_empty() {
            public.push(category.complaint().to_string());
            sensitive.push(format!("{} ({})", category.complaint(), human_join(&quote_all(&words))));
        }
    }
    if !result.transformations.is_empty() {
        let text = "simple transformations of words or phrases";
        public.push(text.to_string());
        sensitive.push(format!("{} ({})", text, human_join(&quote_all(&result.transformations))));
    }

    if let Some(first) = hits.first() {
        let mut reason = "Attackers use software that automatically guesses millions of words commonly found in dictionaries, wordlists, or other people's passwords".to_string();
        if min_commonness < LITERAL_COMMONNESS {
            reason.push_str(", including simple transformations of those words/phrases where they substitute digits and symbols for letters");
        }
        result.feedback = Some(Feedback {
            public_text: format!("Don't use {}", public.join(" or ")),
            sensitive_text: format!("Don't use {}", sensitive.join(" or ")),
            reason_why: reason,
            problem_text: first.token.clone(),
        });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn names(words: &[&str]) -> Dictionaries {
        let mut dictionaries = Dictionaries::new();
        dictionaries.insert(Category::Names, words.iter().copied());
        dictionaries
    }

    #[test]
    fn test_insert_enforces_invariants() {
        let mut dictionaries = Dictionaries::new();
        assert_eq!(dictionaries.insert(Category::Names, ["John", "al", " smith "]), 2);
        assert!(dictionaries.contains(Category::Names, "john"));
        assert!(dictionaries.contains(Category::Names, "smith"));
        assert!(!dictionaries.contains(Category::Names, "al"));

        // already a name, so not added as an English word
        assert_eq!(dictionaries.insert(Category::EnglishWords, ["john", "table"]), 1);
        assert_eq!(dictionaries.category_of("john"), Some(Category::Names));
        assert_eq!(dictionaries.len(Category::EnglishWords), 1);
    }

    #[test]
    fn test_builtin_pet_names() {
        let dictionaries = Dictionaries::with_builtin_pet_names();
        assert!(dictionaries.contains(Category::PetNames, "fluffy"));
        assert_eq!(dictionaries.category_of("whiskers"), None);
    }

    #[test]
    fn test_load_category_from_path() {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(temp_file, "Dragon").expect("Failed to write");
        writeln!(temp_file, "sunshine").expect("Failed to write");
        writeln!(temp_file).expect("Failed to write");

        let mut dictionaries = Dictionaries::new();
        let count = dictionaries
            .load_category_from_path(Category::Passwords, temp_file.path())
            .expect("loads");
        assert_eq!(count, 2);
        assert!(dictionaries.contains(Category::Passwords, "dragon"));
    }

    #[test]
    fn test_load_category_missing_file() {
        let mut dictionaries = Dictionaries::new();
        let result = dictionaries.load_category_from_path(Category::Names, "/nonexistent/names.txt");
        assert!(matches!(result, Err(DictionaryError::FileNotFound(_))));
    }

    #[test]
    fn test_match_words_john_smith() {
        let dictionaries = names(&["john", "smith"]);
        let result = match_words("mynameisjohnsmith", &dictionaries);

        assert_eq!(
            result.words,
            vec![
                (Category::Names, "smith".to_string()),
                (Category::Names, "john".to_string()),
            ]
        );
        assert_eq!(result.length, 9);
        assert_eq!(result.tokens, 2);
        assert_eq!(result.uncommonness, 0.0);
        let feedback = result.feedback.unwrap();
        assert_eq!(feedback.public_text, "Don't use names");
        assert_eq!(feedback.sensitive_text, "Don't use names (\"smith\" and \"john\")");
    }

    #[test]
    fn test_match_words_leetspeak() {
        let mut dictionaries = Dictionaries::new();
        dictionaries.insert(Category::EnglishWords, ["password"]);
        let result = match_words("p4ssw0rd!", &dictionaries);

        assert!(result.words.is_empty());
        assert_eq!(result.transformations, vec!["password → p4ssw0rd".to_string()]);
        assert_eq!(result.length, 8);
        assert!((result.uncommonness - (100.0 - 3.1)).abs() < 1e-9);
        let feedback = result.feedback.unwrap();
        assert!(feedback.reason_why.contains("substitute digits"));
    }

    #[test]
    fn test_match_words_splits_on_delimiters() {
        let dictionaries = names(&["anna"]);
        let result = match_words("an-na99", &dictionaries);
        assert_eq!(result.tokens, 1);

        let empty = match_words("anything", &Dictionaries::new());
        assert_eq!(empty, DictionaryMatch::default());
    }
}
