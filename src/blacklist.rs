//! Blacklist management module
//!
//! Handles loading and querying the password blacklist. The index is either
//! an exact set of whole passwords or a bloom filter probed with every
//! substring of at least the configured length; which one is decided by the
//! policy when the index is built.

use crate::bloom::BloomFilter;
use crate::config::BlacklistPolicy;
use crate::text::char_len;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlacklistError {
    #[error("Blacklist file not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Failed to read blacklist file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Blacklist file is empty")]
    EmptyFile,
}

/// Returns the blacklist file path.
///
/// Priority:
/// 1. `blacklistFile` from the policy
/// 2. Environment variable `PWD_BLACKLIST_PATH`
/// 3. Default path `./assets/blacklist.txt`
pub fn resolve_blacklist_path(policy: &BlacklistPolicy) -> PathBuf {
    if let Some(path) = &policy.blacklist_file {
        return path.clone();
    }
    std::env::var("PWD_BLACKLIST_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./assets/blacklist.txt"))
}

#[derive(Debug, Clone)]
pub enum BlacklistIndex {
    /// Whole-password lookups.
    Exact(HashSet<String>),
    /// Any substring of `min_len..=max_len` characters may match.
    Substring {
        filter: BloomFilter,
        min_len: usize,
        max_len: usize,
    },
}

impl BlacklistIndex {
    /// An index that never matches.
    pub fn empty() -> Self {
        Self::Exact(HashSet::new())
    }

    /// Builds the index the policy asks for. Entries are trimmed and, unless
    /// the policy is case sensitive, lowercased.
    pub fn from_entries<I, S>(policy: &BlacklistPolicy, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries: HashSet<String> = entries
            .into_iter()
            .map(|e| e.as_ref().trim().to_string())
            .filter(|e| !e.is_empty())
            .map(|e| if policy.case_sensitive { e } else { e.to_lowercase() })
            .collect();

        if !policy.check_substrings {
            return Self::Exact(entries);
        }

        let min_len = policy.check_substring_length.max(1);
        let mut filter = BloomFilter::with_capacity(entries.len());
        let mut max_len = 0;
        for entry in entries.iter().filter(|e| char_len(e) >= min_len) {
            filter.insert(entry);
            max_len = max_len.max(char_len(entry));
        }
        Self::Substring {
            filter,
            min_len,
            max_len,
        }
    }

    /// Loads the blacklist from the path resolved by [`resolve_blacklist_path`].
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File does not exist
    /// - File cannot be read
    /// - File is empty
    pub fn load(policy: &BlacklistPolicy) -> Result<Self, BlacklistError> {
        let path = resolve_blacklist_path(policy);
        Self::load_from_path(policy, &path)
    }

    /// Loads the blacklist from a specific file path.
    pub fn load_from_path<P: AsRef<Path>>(policy: &BlacklistPolicy, path: P) -> Result<Self, BlacklistError> {
        let path = path.as_ref();

        if !path.exists() {
            #[cfg(feature = "tracing")]
            tracing::error!("Blacklist initialization FAILED: FileNotFound {:?}", path);
            return Err(BlacklistError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;

        if content.trim().is_empty() {
            #[cfg(feature = "tracing")]
            tracing::error!("Blacklist initialization FAILED: Empty file {:?}", path);
            return Err(BlacklistError::EmptyFile);
        }

        let index = Self::from_entries(policy, content.lines());

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Blacklist initialized from {:?} ({})",
            path,
            if policy.check_substrings { "substring" } else { "exact" }
        );

        Ok(index)
    }

    /// Whether a normalized password is blacklisted.
    pub fn rejects(&self, normalized: &str) -> bool {
        self.longest_match(normalized).is_some()
    }

    /// The blacklisted text found in `normalized`: the whole string in exact
    /// mode, the longest matching substring in substring mode.
    pub fn longest_match(&self, normalized: &str) -> Option<String> {
        match self {
            Self::Exact(set) => set.contains(normalized).then(|| normalized.to_string()),
            Self::Substring {
                filter,
                min_len,
                max_len,
            } => {
                let chars: Vec<char> = normalized.chars().collect();
                let longest = (*max_len).min(chars.len());
                (*min_len..=longest).rev().find_map(|len| {
                    chars
                        .windows(len)
                        .map(|w| w.iter().collect::<String>())
                        .find(|s| filter.contains(s))
                })
            }
        }
    }
}
