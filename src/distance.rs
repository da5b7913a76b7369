//! Constrained edit distance between a candidate lemma and a candidate
//! surface form.

/// Widest edit distance the pipeline accepts for a lemma/non-lemma pair.
pub const MAX_DISTANCE: i32 = 3;

/// Modified Levenshtein distance, or -1 when the pair is not comparable.
///
/// Cheap rejections before the table is built:
/// - a lemma longer than the surface form (surface forms are assumed to be
///   lemma plus suffix, never lemma minus characters),
/// - a length gap above [`MAX_DISTANCE`],
/// - fewer than three quarters of the lemma's positions agreeing with the
///   surface form, which rejects unrelated words of similar length.
pub fn modified_levenshtein(lemma: &str, non_lemma: &str) -> i32 {
    let lemma: Vec<char> = lemma.chars().collect();
    let non_lemma: Vec<char> = non_lemma.chars().collect();

    if lemma.len() > non_lemma.len() || non_lemma.len() - lemma.len() > MAX_DISTANCE as usize {
        return -1;
    }

    let prefix_match_count = lemma
        .iter()
        .zip(&non_lemma)
        .filter(|(a, b)| a == b)
        .count();
    if 4 * prefix_match_count < 3 * lemma.len() {
        return -1;
    }

    let rows = lemma.len() + 1;
    let cols = non_lemma.len() + 1;
    let mut distances = vec![vec![0usize; cols]; rows];

    for (t1, row) in distances.iter_mut().enumerate() {
        row[0] = t1;
    }
    for t2 in 0..cols {
        distances[0][t2] = t2;
    }

    for t1 in 1..rows {
        for t2 in 1..cols {
            if lemma[t1 - 1] == non_lemma[t2 - 1] {
                distances[t1][t2] = distances[t1 - 1][t2 - 1];
            } else {
                let a = distances[t1][t2 - 1];
                let b = distances[t1 - 1][t2];
                let c = distances[t1 - 1][t2 - 1];
                distances[t1][t2] = 1 + a.min(b).min(c);
            }
        }
    }

    distances[rows - 1][cols - 1] as i32
}

/// Acceptance window applied by the pipeline. Identical strings (distance 0)
/// are deliberately not treated as a pair; they carry no lemmatization
/// information.
pub fn is_accepted(distance: i32) -> bool {
    distance > 0 && distance <= MAX_DISTANCE
}

#[cfg(test)]
mod tests {
    use super::{is_accepted, modified_levenshtein};

    #[test]
    fn rejects_lemma_longer_than_surface_form() {
        assert_eq!(modified_levenshtein("cats", "cat"), -1);
    }

    #[test]
    fn rejects_length_gap_above_budget() {
        assert_eq!(modified_levenshtein("a", "elephant"), -1);
    }

    #[test]
    fn rejects_low_prefix_agreement() {
        assert_eq!(modified_levenshtein("horse", "zzzzz"), -1);
    }

    #[test]
    fn computes_plain_edit_distance_within_guards() {
        assert_eq!(modified_levenshtein("run", "runs"), 1);
        assert_eq!(modified_levenshtein("cat", "cats"), 1);
        assert_eq!(modified_levenshtein("walk", "walked"), 2);
    }

    #[test]
    fn compares_characters_not_bytes() {
        assert_eq!(modified_levenshtein("žena", "ženy"), 1);
        assert_eq!(modified_levenshtein("mesto", "mestom"), 1);
    }

    #[test]
    fn identical_strings_have_distance_zero() {
        assert_eq!(modified_levenshtein("mesto", "mesto"), 0);
    }

    #[test]
    fn acceptance_window_excludes_zero_and_sentinel() {
        assert!(!is_accepted(-1));
        assert!(!is_accepted(0));
        assert!(is_accepted(1));
        assert!(is_accepted(3));
        assert!(!is_accepted(4));
    }
}
