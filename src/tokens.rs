//! Token cleaning against a stop-word list.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::normalize;

/// Stop words loaded once per run and shared read-only by every worker.
#[derive(Debug, Clone, Default)]
pub struct StopWordSet {
    words: HashSet<String>,
}

impl StopWordSet {
    /// Loads one word per line, fully into memory. The pipeline cannot
    /// establish token validity without the list, so failure is fatal.
    pub fn load(path: &Path) -> io::Result<Self> {
        let file = File::open(path).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("failed to open stop-word list {}: {}", path.display(), e),
            )
        })?;

        let mut words = HashSet::new();
        for line in BufReader::new(file).lines() {
            let word = line?.trim().to_string();
            if !word.is_empty() {
                words.insert(word);
            }
        }
        Ok(Self { words })
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// Tokens of two characters or fewer count as stop words no matter what
    /// the list says.
    pub fn is_stop_word(&self, token: &str) -> bool {
        token.chars().count() <= 2 || self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Lowercases each token and keeps those that carry a letter and are not
/// stop words. Order preserved, no deduplication.
pub fn clean_tokens<'a, I>(tokens: I, stop_words: &StopWordSet) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    tokens
        .into_iter()
        .filter_map(|token| {
            let token = token.to_lowercase();
            if normalize::contains_letters(&token) && !stop_words.is_stop_word(&token) {
                Some(token)
            } else {
                None
            }
        })
        .collect()
}
