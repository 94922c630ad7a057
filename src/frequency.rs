use crate::results::WordFrequencyTable;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Counts above this value are reported
pub const DEFAULT_THRESHOLD: usize = 2;

// Accented letters fall outside the class and act as separators.
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9'-]+").expect("word pattern is valid"));

/// Count the words shared by a run's translated titles.
///
/// Titles are joined with single spaces and lowercased, then split into runs
/// of `[a-z0-9'-]`. Only words seen more than `threshold` times are kept.
pub fn aggregate<S: AsRef<str>>(titles: &[S], threshold: usize) -> WordFrequencyTable {
    if titles.is_empty() {
        return WordFrequencyTable::default();
    }

    let text = titles
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    // Counts plus the order each word was first seen in
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for word in WORD.find_iter(&text) {
        let word = word.as_str();
        *counts.entry(word).or_insert_with(|| {
            order.push(word);
            0
        }) += 1;
    }
    let counts: Vec<(String, usize)> = order
        .into_iter()
        .map(|word| (word, counts[word]))
        .filter(|(_, count)| *count > threshold)
        .map(|(word, count)| (word.to_string(), count))
        .collect();

    ::log::debug!(
        "{} words repeated more than {} times across {} titles",
        counts.len(),
        threshold,
        titles.len()
    );

    WordFrequencyTable::from_counts(counts)
}
