//! Character-set filtering and HTML entity decoding.

use html_escape::decode_html_entities;
use lazy_static::lazy_static;
use regex::Regex;

/// Accented letters used by Slovak, lower and upper case.
pub const ACCENTED_LETTERS: &str = "áäčďéíĺľňóôŕšťúýžÁÄČĎÉÍĹĽŇÓÔŔŠŤÚÝŽ";

lazy_static! {
    // Any maximal run of characters outside the working alphabet. The `|`
    // field separator survives cleaning so record lines stay splittable.
    static ref NON_ALPHABET: Regex =
        Regex::new(&format!("[^a-zA-Z{}|]+", ACCENTED_LETTERS)).unwrap();
}

/// True when the string carries at least one ASCII letter. Every stage uses
/// this to decide whether a string is worth keeping.
pub fn contains_letters(text: &str) -> bool {
    text.bytes().any(|b| b.is_ascii_alphabetic())
}

/// Decodes HTML entities, replaces literal `&nbsp;`/`&amp;` residues, maps
/// every run of out-of-alphabet characters to a single space and trims.
/// Returns `None` when nothing letter-bearing is left.
pub fn clean(text: &str) -> Option<String> {
    let decoded = decode_html_entities(text)
        .replace("&nbsp;", " ")
        .replace("&amp;", " ");
    let filtered = NON_ALPHABET.replace_all(&decoded, " ");
    let trimmed = filtered.trim();

    if contains_letters(trimmed) {
        Some(trimmed.to_string())
    } else {
        None
    }
}
