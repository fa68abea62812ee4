//! String helpers shared by the detectors and the dictionary matcher.
//!
//! All positions are character positions, never byte offsets.

/// Joins items for display: `a`, `a and b`, `a, b and c`.
pub fn human_join<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => "(empty)".to_string(),
        [only] => only.as_ref().to_string(),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(AsRef::as_ref).collect();
            format!("{} and {}", head.join(", "), last.as_ref())
        }
    }
}

/// Removes repeated items, keeping the first occurrence of each.
pub fn dedup_preserving_order<T: PartialEq + Clone>(items: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

/// Keeps one instance of each character, in first-seen order.
pub fn distinct_chars(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    dedup_preserving_order(&chars).into_iter().collect()
}

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Every substring of every part, longest first.
///
/// Lengths run from `max` (or the longest part) down to `min`; within a
/// length, parts are visited in order and starts left to right.
pub fn substrings_min_max<S: AsRef<str>>(parts: &[S], min: usize, max: Option<usize>) -> Vec<String> {
    let parts: Vec<Vec<char>> = parts.iter().map(|p| p.as_ref().chars().collect()).collect();
    let longest = parts.iter().map(Vec::len).max().unwrap_or(0);
    let max = max.unwrap_or(longest);
    let min = min.max(1);

    let mut out = Vec::new();
    for len in (min..=max).rev() {
        for part in &parts {
            if part.len() < len {
                continue;
            }
            for start in 0..=part.len() - len {
                out.push(part[start..start + len].iter().collect());
            }
        }
    }
    out
}

/// Every substring of the lowercased input with at least `min` characters, longest first.
pub fn substrings_no_filter(s: &str, min: usize) -> Vec<String> {
    let lowered = s.to_lowercase();
    substrings_min_max(&[lowered], min, None)
}

/// Character index of the first occurrence of `needle`, ignoring case.
pub fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let hay: Vec<char> = haystack.chars().collect();
    let needle: Vec<char> = needle.chars().collect();
    if needle.is_empty() || needle.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - needle.len()).find(|&i| {
        hay[i..i + needle.len()]
            .iter()
            .zip(&needle)
            .all(|(a, b)| a.to_lowercase().eq(b.to_lowercase()))
    })
}

/// Removes the first case-insensitive occurrence of `needle`; returns `None` when absent.
pub fn remove_first_ignore_case(haystack: &str, needle: &str) -> Option<String> {
    let start = find_ignore_case(haystack, needle)?;
    let len = char_len(needle);
    Some(
        haystack
            .chars()
            .enumerate()
            .filter(|(i, _)| *i < start || *i >= start + len)
            .map(|(_, c)| c)
            .collect(),
    )
}

/// Splits `part` around the first occurrence of `needle`, dropping empty pieces.
pub(crate) fn split_out(part: &str, needle: &str) -> Option<Vec<String>> {
    let byte = part.find(needle)?;
    let left = &part[..byte];
    let right = &part[byte + needle.len()..];
    Some(
        [left, right]
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_join() {
        let none: [&str; 0] = [];
        assert_eq!(human_join(&none), "(empty)");
        assert_eq!(human_join(&["foo"]), "foo");
        assert_eq!(human_join(&["foo", "bar"]), "foo and bar");
        assert_eq!(human_join(&["foo", "bar", "baz"]), "foo, bar and baz");
    }

    #[test]
    fn test_dedup_preserving_order() {
        assert_eq!(dedup_preserving_order(&["b", "a", "b", "c", "a"]), vec!["b", "a", "c"]);
        assert_eq!(distinct_chars("aabbcab"), "abc");
    }

    #[test]
    fn test_substrings_min_max_order() {
        let subs = substrings_min_max(&["abcd", "xy"], 2, None);
        assert_eq!(
            subs,
            vec!["abcd", "abc", "bcd", "ab", "bc", "cd", "xy"]
        );

        let capped = substrings_min_max(&["abcd"], 2, Some(2));
        assert_eq!(capped, vec!["ab", "bc", "cd"]);
    }

    #[test]
    fn test_substrings_no_filter_lowercases() {
        let subs = substrings_no_filter("AbC", 2);
        assert_eq!(subs, vec!["abc", "ab", "bc"]);
    }

    #[test]
    fn test_remove_first_ignore_case() {
        assert_eq!(remove_first_ignore_case("xxJohnyy", "john").as_deref(), Some("xxyy"));
        assert_eq!(remove_first_ignore_case("abcabc", "abc").as_deref(), Some("abc"));
        assert_eq!(remove_first_ignore_case("abc", "zzz"), None);
        assert_eq!(remove_first_ignore_case("abc", ""), None);
    }

    #[test]
    fn test_split_out() {
        assert_eq!(split_out("mynameisjohn", "name"), Some(vec!["my".to_string(), "isjohn".to_string()]));
        assert_eq!(split_out("john", "john"), Some(vec![]));
        assert_eq!(split_out("john", "x"), None);
    }
}
