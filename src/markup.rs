//! Link grammar: extracts `[[link|anchor]]suffix` constructs from raw
//! markup lines and resolves them into link/anchor-text records.

use lazy_static::lazy_static;
use regex::Regex;

use crate::normalize::ACCENTED_LETTERS;

lazy_static! {
    // `[[ LINK ( | ANCHOR )? ]] SUFFIX?` where LINK and ANCHOR exclude `|`
    // and `]`, and SUFFIX is a contiguous run of alphabet letters directly
    // after the closing brackets (captures inflected anchors like "[[cat]]s").
    static ref LINK_PATTERN: Regex = Regex::new(&format!(
        r"\[\[([^|\]]+)\|?([^|\]]+)?\]\]([a-zA-Z{}]+)?",
        ACCENTED_LETTERS
    ))
    .unwrap();
    // Wiki disambiguation convention: "Mercury (planet)" -> "Mercury".
    static ref DISAMBIGUATION: Regex = Regex::new(r"\(.*\)").unwrap();
}

/// One `[[...]]` occurrence as matched on a raw markup line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMatch {
    pub link: String,
    pub anchor_text: Option<String>,
    pub anchor_suffix: Option<String>,
}

impl LinkMatch {
    /// Resolves the display text: an explicit anchor wins, otherwise a
    /// letter suffix reconstructs the inflected form, otherwise absent.
    pub fn resolve(self) -> ParsedRecord {
        let anchor_text = match (self.anchor_text, self.anchor_suffix) {
            (Some(anchor), _) => Some(anchor),
            (None, Some(suffix)) => Some(format!("{}{}", self.link, suffix)),
            (None, None) => None,
        };
        ParsedRecord {
            link: self.link,
            anchor_text,
        }
    }
}

/// A link with its resolved display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub link: String,
    pub anchor_text: Option<String>,
}

impl ParsedRecord {
    /// Record-line form: `link|anchor` or a bare `link`.
    pub fn to_line(&self) -> String {
        match &self.anchor_text {
            Some(anchor) => format!("{}|{}", self.link, anchor),
            None => self.link.clone(),
        }
    }
}

/// Lazily yields every link construct on one raw line. Lines without a
/// single match yield an empty sequence; malformed constructs (an extra `|`
/// inside the brackets, unbalanced brackets) simply never match.
pub fn link_matches(line: &str) -> impl Iterator<Item = LinkMatch> + '_ {
    LINK_PATTERN.captures_iter(line).map(|caps| {
        let link = DISAMBIGUATION
            .replace_all(&caps[1], "")
            .trim()
            .to_string();
        LinkMatch {
            link,
            anchor_text: caps.get(2).map(|m| m.as_str().to_string()),
            anchor_suffix: caps.get(3).map(|m| m.as_str().to_string()),
        }
    })
}

/// Stage A on one raw line: every link construct, resolved.
pub fn parse_line(line: &str) -> Vec<ParsedRecord> {
    link_matches(line).map(LinkMatch::resolve).collect()
}

/// Splits a persisted record line back into link and anchor text. Lines
/// with more than one separator are diagnosed and treated as if no anchor
/// text were present; an empty anchor field counts as absent.
pub fn split_record(line: &str) -> (&str, Option<&str>) {
    let mut parts = line.split('|');
    let link = parts.next().unwrap_or("");
    let anchor_text = parts.next().filter(|anchor| !anchor.is_empty());

    if parts.next().is_some() {
        eprintln!("split_record(): invalid row: {:?}", line);
        return (link, None);
    }

    (link, anchor_text)
}
