//! Consumers of the dictionary file: lemma/non-lemma lookup indexes and a
//! corpus statistics pass over the `lemma` / `lemma|non_lemma` line format.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::{self, BufRead};

use serde::Serialize;

use crate::markup;

/// Maps each lemma to the set of surface forms observed for it.
#[derive(Debug, Default)]
pub struct LemmaIndex {
    entries: HashMap<String, BTreeSet<String>>,
}

impl LemmaIndex {
    pub fn build(reader: impl BufRead) -> io::Result<Self> {
        let mut index = Self::default();

        for line in reader.lines() {
            let line = line?;
            let (lemma, non_lemma) = markup::split_record(line.trim_end());
            if lemma.is_empty() {
                continue;
            }

            let forms = index.entries.entry(lemma.to_string()).or_default();
            if let Some(non_lemma) = non_lemma {
                forms.insert(non_lemma.to_string());
            }
        }

        Ok(index)
    }

    pub fn get(&self, lemma: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(lemma)
    }

    /// Looks up every whitespace-separated term of the query, lowercased.
    pub fn lookup(&self, query: &str) -> Vec<(String, Option<&BTreeSet<String>>)> {
        query
            .split_whitespace()
            .map(|term| {
                let term = term.to_lowercase();
                let forms = self.entries.get(&term);
                (term, forms)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Maps each surface form back to its first-seen lemma.
#[derive(Debug, Default)]
pub struct NonLemmaIndex {
    entries: HashMap<String, String>,
}

impl NonLemmaIndex {
    pub fn build(reader: impl BufRead) -> io::Result<Self> {
        let mut index = Self::default();

        for line in reader.lines() {
            let line = line?;
            let (lemma, non_lemma) = markup::split_record(line.trim_end());
            if lemma.is_empty() {
                continue;
            }

            if let Some(non_lemma) = non_lemma {
                index
                    .entries
                    .entry(non_lemma.to_string())
                    .or_insert_with(|| lemma.to_string());
            }
        }

        Ok(index)
    }

    pub fn get(&self, non_lemma: &str) -> Option<&str> {
        self.entries.get(non_lemma).map(String::as_str)
    }

    pub fn lookup(&self, query: &str) -> Vec<(String, Option<&str>)> {
        query
            .split_whitespace()
            .map(|term| {
                let term = term.to_lowercase();
                let lemma = self.entries.get(&term).map(String::as_str);
                (term, lemma)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One pass over a dictionary file: unique lemma, non-lemma and word counts
/// plus per-lemma occurrence counts.
#[derive(Debug, Default)]
pub struct CorpusStatistics {
    pub unique_lemma_count: usize,
    pub unique_non_lemma_count: usize,
    pub unique_word_count: usize,
    lemma_counts: HashMap<String, u64>,
}

/// Statistics shaped for reporting, with the top-N most frequent lemmas.
#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub unique_lemma_count: usize,
    pub unique_non_lemma_count: usize,
    pub unique_word_count: usize,
    pub top_lemmas: Vec<(String, u64)>,
}

impl CorpusStatistics {
    pub fn compute(reader: impl BufRead) -> io::Result<Self> {
        let mut lemma_counts: HashMap<String, u64> = HashMap::new();
        let mut non_lemmas: HashSet<String> = HashSet::new();

        for line in reader.lines() {
            let line = line?;
            let (lemma, non_lemma) = markup::split_record(line.trim_end());
            if lemma.is_empty() {
                continue;
            }

            *lemma_counts.entry(lemma.to_string()).or_insert(0) += 1;
            if let Some(non_lemma) = non_lemma {
                non_lemmas.insert(non_lemma.to_string());
            }
        }

        let unique_word_count = lemma_counts
            .keys()
            .chain(non_lemmas.iter())
            .collect::<HashSet<_>>()
            .len();

        Ok(Self {
            unique_lemma_count: lemma_counts.len(),
            unique_non_lemma_count: non_lemmas.len(),
            unique_word_count,
            lemma_counts,
        })
    }

    /// The `n` most frequent lemmas, ties broken alphabetically so the
    /// ordering is deterministic.
    pub fn top_lemmas(&self, n: usize) -> Vec<(String, u64)> {
        let mut entries: Vec<(String, u64)> = self
            .lemma_counts
            .iter()
            .map(|(lemma, count)| (lemma.clone(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(n);
        entries
    }

    pub fn report(&self, top_n: usize) -> StatsReport {
        StatsReport {
            unique_lemma_count: self.unique_lemma_count,
            unique_non_lemma_count: self.unique_non_lemma_count,
            unique_word_count: self.unique_word_count,
            top_lemmas: self.top_lemmas(top_n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CorpusStatistics, LemmaIndex, NonLemmaIndex};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const DICTIONARY: &str = "\
zviera|zvieratá\n\
zviera|zvierat\n\
mesto|mesta\n\
mesto\n\
rieka\n\
zviera|zvieratá\n";

    #[test]
    fn lemma_index_collects_surface_forms() {
        let index = LemmaIndex::build(Cursor::new(DICTIONARY)).unwrap();

        assert_eq!(index.len(), 3);
        let forms: Vec<&str> = index
            .get("zviera")
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(forms, vec!["zvierat", "zvieratá"]);
        assert!(index.get("rieka").unwrap().is_empty());
        assert_eq!(index.get("zvieratá"), None);
    }

    #[test]
    fn lemma_lookup_lowercases_terms() {
        let index = LemmaIndex::build(Cursor::new(DICTIONARY)).unwrap();
        let results = index.lookup("Mesto neznáme");

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "mesto");
        assert!(results[0].1.is_some());
        assert_eq!(results[1].0, "neznáme");
        assert!(results[1].1.is_none());
    }

    #[test]
    fn non_lemma_index_keeps_first_seen_lemma() {
        let input = "prvy|tvar\ndruhy|tvar\n";
        let index = NonLemmaIndex::build(Cursor::new(input)).unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.get("tvar"), Some("prvy"));
    }

    #[test]
    fn statistics_count_unique_words_as_a_union() {
        let stats = CorpusStatistics::compute(Cursor::new(DICTIONARY)).unwrap();

        assert_eq!(stats.unique_lemma_count, 3);
        assert_eq!(stats.unique_non_lemma_count, 3);
        // zviera, mesto, rieka, zvieratá, zvierat, mesta
        assert_eq!(stats.unique_word_count, 6);
    }

    #[test]
    fn union_counts_shared_words_once() {
        let input = "mesto|mesta\nmesta\n";
        let stats = CorpusStatistics::compute(Cursor::new(input)).unwrap();

        assert_eq!(stats.unique_lemma_count, 2);
        assert_eq!(stats.unique_non_lemma_count, 1);
        assert_eq!(stats.unique_word_count, 2);
    }

    #[test]
    fn top_lemmas_order_by_count_then_name() {
        let stats = CorpusStatistics::compute(Cursor::new(DICTIONARY)).unwrap();

        assert_eq!(
            stats.top_lemmas(2),
            vec![("zviera".to_string(), 3), ("mesto".to_string(), 2)]
        );
        assert_eq!(stats.top_lemmas(10).len(), 3);
    }
}
