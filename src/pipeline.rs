//! Three-stage lemmatization pipeline: parse, clean, tokenize-and-pair.
//!
//! The per-record stage functions here are pure; the sequential runner
//! materializes each stage into a file before the next starts, while the
//! partitioned backend in [`crate::parallel`] fuses the same functions over
//! record partitions. Both produce identical records for identical input.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::distance;
use crate::markup::{self, ParsedRecord};
use crate::normalize;
use crate::tokens::{self, StopWordSet};

/// Cap on how many link tokens one record may contribute.
pub const MAX_WORD_COUNT: usize = 3;

/// Final output unit: a bare lemma or a lemma with one surface form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LemmaPairRecord {
    pub lemma: String,
    pub non_lemma: Option<String>,
}

impl LemmaPairRecord {
    pub fn to_line(&self) -> String {
        match &self.non_lemma {
            Some(non_lemma) => format!("{}|{}", self.lemma, non_lemma),
            None => self.lemma.clone(),
        }
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunStats {
    pub lines_read: usize,
    pub records_parsed: usize,
    pub records_cleaned: usize,
    pub lemmas_written: usize,
    pub pairs_written: usize,
    pub token_count_mismatches: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RunStats {
    pub fn records_written(&self) -> usize {
        self.lemmas_written + self.pairs_written
    }
}

/// Stage A on one raw line.
pub fn parse_record(line: &str) -> Vec<ParsedRecord> {
    markup::parse_line(line)
}

/// Stage B on one parsed record. A record whose link loses every letter is
/// worthless even if the anchor survives, so it is dropped; an anchor text
/// that cleans away is demoted to absent.
pub fn clean_record(record: &ParsedRecord) -> Option<ParsedRecord> {
    let link = normalize::clean(&record.link)?;
    let anchor_text = record.anchor_text.as_deref().and_then(normalize::clean);
    Some(ParsedRecord { link, anchor_text })
}

/// What stage C produced for one cleaned record.
#[derive(Debug, Default)]
pub struct TokenizeOutcome {
    pub records: Vec<LemmaPairRecord>,
    pub token_count_mismatch: bool,
}

/// Stage C on one cleaned record: tokenize both fields, then pair each of
/// the first [`MAX_WORD_COUNT`] link tokens with every anchor token whose
/// edit distance falls in the acceptance window. A lemma with no accepted
/// match is emitted bare.
pub fn tokenize_and_pair(record: &ParsedRecord, stop_words: &StopWordSet) -> TokenizeOutcome {
    let link_tokens = tokens::clean_tokens(record.link.split_whitespace(), stop_words);
    let anchor_tokens = record
        .anchor_text
        .as_deref()
        .map(|anchor| tokens::clean_tokens(anchor.split_whitespace(), stop_words))
        .unwrap_or_default();

    let mut outcome = TokenizeOutcome::default();

    if link_tokens.is_empty() {
        return outcome;
    }

    if anchor_tokens.is_empty() {
        for lemma in link_tokens.into_iter().take(MAX_WORD_COUNT) {
            outcome.records.push(LemmaPairRecord {
                lemma,
                non_lemma: None,
            });
        }
        return outcome;
    }

    outcome.token_count_mismatch = link_tokens.len() != anchor_tokens.len();

    for lemma in link_tokens.into_iter().take(MAX_WORD_COUNT) {
        let mut matched = false;

        for non_lemma in &anchor_tokens {
            let d = distance::modified_levenshtein(&lemma, non_lemma);
            if distance::is_accepted(d) {
                matched = true;
                outcome.records.push(LemmaPairRecord {
                    lemma: lemma.clone(),
                    non_lemma: Some(non_lemma.clone()),
                });
            }
        }

        if !matched {
            outcome.records.push(LemmaPairRecord {
                lemma,
                non_lemma: None,
            });
        }
    }

    outcome
}

/// All three stages fused over one raw line. The partitioned backend maps
/// this over every line of a partition.
#[derive(Debug, Default)]
pub struct LineOutcome {
    pub records: Vec<LemmaPairRecord>,
    pub records_parsed: usize,
    pub records_cleaned: usize,
    pub token_count_mismatches: usize,
}

pub fn lemmatize_line(line: &str, stop_words: &StopWordSet) -> LineOutcome {
    let mut outcome = LineOutcome::default();

    for parsed in parse_record(line) {
        outcome.records_parsed += 1;

        let Some(cleaned) = clean_record(&parsed) else {
            continue;
        };
        outcome.records_cleaned += 1;

        let stage = tokenize_and_pair(&cleaned, stop_words);
        if stage.token_count_mismatch {
            outcome.token_count_mismatches += 1;
        }
        outcome.records.extend(stage.records);
    }

    outcome
}

/// File-backed sequential pipeline. Single thread, strictly ordered; each
/// stage reads its predecessor's complete artifact before starting.
pub struct SequentialPipeline {
    work_dir: PathBuf,
    quiet: bool,
    limit: Option<usize>,
}

impl SequentialPipeline {
    pub fn new(work_dir: PathBuf, quiet: bool, limit: Option<usize>) -> Self {
        Self {
            work_dir,
            quiet,
            limit,
        }
    }

    pub fn parsed_path(&self) -> PathBuf {
        self.work_dir.join("parsed.txt")
    }

    pub fn cleaned_path(&self) -> PathBuf {
        self.work_dir.join("cleaned.txt")
    }

    pub fn run(
        &self,
        reader: impl BufRead,
        output_path: &Path,
        stop_words: &StopWordSet,
    ) -> io::Result<RunStats> {
        fs::create_dir_all(&self.work_dir)?;

        let start_time = Instant::now();
        let mut stats = RunStats::default();

        self.stage_parse(reader, &self.parsed_path(), &mut stats)?;
        if !self.quiet {
            println!("Parsing stage finished");
        }

        self.stage_clean(&self.parsed_path(), &self.cleaned_path(), &mut stats)?;
        if !self.quiet {
            println!("Cleaning stage finished");
        }

        self.stage_tokenize(&self.cleaned_path(), output_path, stop_words, &mut stats)?;
        if !self.quiet {
            println!("Lemmatization stage finished");
        }

        stats.elapsed = start_time.elapsed();
        Ok(stats)
    }

    fn progress_bar(&self) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap(),
        );
        pb
    }

    fn stage_parse(
        &self,
        reader: impl BufRead,
        parsed_path: &Path,
        stats: &mut RunStats,
    ) -> io::Result<()> {
        let mut writer = BufWriter::with_capacity(256 * 1024, File::create(parsed_path)?);
        let pb = self.progress_bar();

        for line in reader.lines() {
            let line = line?;
            stats.lines_read += 1;

            if stats.lines_read % 1000 == 0 {
                pb.set_message(format!(
                    "Lines: {} | Records: {}",
                    stats.lines_read, stats.records_parsed
                ));
            }

            for record in parse_record(&line) {
                writeln!(writer, "{}", record.to_line())?;
                stats.records_parsed += 1;
            }
        }

        pb.finish_and_clear();
        writer.flush()
    }

    fn stage_clean(
        &self,
        parsed_path: &Path,
        cleaned_path: &Path,
        stats: &mut RunStats,
    ) -> io::Result<()> {
        let reader = BufReader::with_capacity(256 * 1024, File::open(parsed_path)?);
        let mut writer = BufWriter::with_capacity(256 * 1024, File::create(cleaned_path)?);

        for line in reader.lines() {
            let line = line?;
            let (link, anchor_text) = markup::split_record(&line);
            let record = ParsedRecord {
                link: link.to_string(),
                anchor_text: anchor_text.map(|a| a.to_string()),
            };

            if let Some(cleaned) = clean_record(&record) {
                writeln!(writer, "{}", cleaned.to_line())?;
                stats.records_cleaned += 1;
            }
        }

        writer.flush()
    }

    fn stage_tokenize(
        &self,
        cleaned_path: &Path,
        output_path: &Path,
        stop_words: &StopWordSet,
        stats: &mut RunStats,
    ) -> io::Result<()> {
        let reader = BufReader::with_capacity(256 * 1024, File::open(cleaned_path)?);
        let mut writer = BufWriter::with_capacity(256 * 1024, File::create(output_path)?);

        for line in reader.lines() {
            let line = line?;
            let (link, anchor_text) = markup::split_record(&line);
            let record = ParsedRecord {
                link: link.to_string(),
                anchor_text: anchor_text.map(|a| a.to_string()),
            };

            let outcome = tokenize_and_pair(&record, stop_words);
            if outcome.token_count_mismatch {
                stats.token_count_mismatches += 1;
            }

            for pair in outcome.records {
                writeln!(writer, "{}", pair.to_line())?;
                if pair.non_lemma.is_some() {
                    stats.pairs_written += 1;
                } else {
                    stats.lemmas_written += 1;
                }

                if let Some(limit) = self.limit {
                    if stats.records_written() >= limit {
                        return writer.flush();
                    }
                }
            }
        }

        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        clean_record, lemmatize_line, tokenize_and_pair, LemmaPairRecord, SequentialPipeline,
    };
    use crate::markup::ParsedRecord;
    use crate::tokens::StopWordSet;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::io::Cursor;

    fn record(link: &str, anchor_text: Option<&str>) -> ParsedRecord {
        ParsedRecord {
            link: link.to_string(),
            anchor_text: anchor_text.map(|a| a.to_string()),
        }
    }

    fn bare(lemma: &str) -> LemmaPairRecord {
        LemmaPairRecord {
            lemma: lemma.to_string(),
            non_lemma: None,
        }
    }

    fn pair(lemma: &str, non_lemma: &str) -> LemmaPairRecord {
        LemmaPairRecord {
            lemma: lemma.to_string(),
            non_lemma: Some(non_lemma.to_string()),
        }
    }

    #[test]
    fn clean_drops_records_with_letterless_links() {
        assert_eq!(clean_record(&record("1234", Some("mesto"))), None);
    }

    #[test]
    fn clean_demotes_letterless_anchors() {
        assert_eq!(
            clean_record(&record("mesto", Some("1234"))),
            Some(record("mesto", None))
        );
    }

    #[test]
    fn clean_normalizes_both_fields() {
        assert_eq!(
            clean_record(&record("  Mesto, 12", Some("mest&aacute;"))),
            Some(record("Mesto", Some("mestá")))
        );
    }

    #[test]
    fn pairs_lemmas_with_matching_surface_forms() {
        let stop_words = StopWordSet::default();
        let outcome = tokenize_and_pair(&record("mesto", Some("mesta mestom vrch")), &stop_words);
        assert_eq!(
            outcome.records,
            vec![pair("mesto", "mesta"), pair("mesto", "mestom")]
        );
        assert!(outcome.token_count_mismatch);
    }

    #[test]
    fn identical_tokens_never_pair() {
        let stop_words = StopWordSet::default();
        let outcome = tokenize_and_pair(&record("mesto", Some("mesto")), &stop_words);
        assert_eq!(outcome.records, vec![bare("mesto")]);
        assert!(!outcome.token_count_mismatch);
    }

    #[test]
    fn caps_link_tokens_at_three() {
        let stop_words = StopWordSet::default();
        let outcome = tokenize_and_pair(&record("alfa beta gama delta epsilon", None), &stop_words);
        assert_eq!(
            outcome.records,
            vec![bare("alfa"), bare("beta"), bare("gama")]
        );
    }

    #[test]
    fn empty_link_tokens_emit_nothing() {
        let stop_words = StopWordSet::from_words(["ale"]);
        let outcome = tokenize_and_pair(&record("ale", Some("mesto")), &stop_words);
        assert_eq!(outcome.records, vec![]);
        assert!(!outcome.token_count_mismatch);
    }

    #[test]
    fn anchor_filtered_to_nothing_emits_bare_lemmas() {
        // "EU" survives cleaning but dies to the two-character stop rule, so
        // both link tokens come out bare.
        let stop_words = StopWordSet::default();
        let outcome = lemmatize_line("[[European Union|EU]] is an organization", &stop_words);
        assert_eq!(outcome.records, vec![bare("european"), bare("union")]);
        assert_eq!(outcome.records_parsed, 1);
        assert_eq!(outcome.records_cleaned, 1);
        assert_eq!(outcome.token_count_mismatches, 0);
    }

    #[test]
    fn sequential_run_materializes_every_stage() {
        let dir = tempfile::tempdir().unwrap();
        let work_dir = dir.path().join("work");
        let output_path = dir.path().join("lemmatized.txt");

        let input = "\
Obec [[Horné Mesto|Horného Mesta]] v okrese.\n\
plain prose without links\n\
[[dom]]y aj [[123]]\n";

        let pipeline = SequentialPipeline::new(work_dir, true, None);
        let stats = pipeline
            .run(
                Cursor::new(input),
                &output_path,
                &StopWordSet::from_words(["obec"]),
            )
            .unwrap();

        assert_eq!(stats.lines_read, 3);
        assert_eq!(stats.records_parsed, 3);
        assert_eq!(stats.records_cleaned, 2);

        let parsed = fs::read_to_string(pipeline.parsed_path()).unwrap();
        assert_eq!(parsed, "Horné Mesto|Horného Mesta\ndom|domy\n123\n");

        let cleaned = fs::read_to_string(pipeline.cleaned_path()).unwrap();
        assert_eq!(cleaned, "Horné Mesto|Horného Mesta\ndom|domy\n");

        let output = fs::read_to_string(&output_path).unwrap();
        assert_eq!(
            output,
            "horné|horného\nmesto|mesta\ndom|domy\n"
        );
        assert_eq!(stats.pairs_written, 3);
        assert_eq!(stats.lemmas_written, 0);
        assert_eq!(stats.token_count_mismatches, 0);
    }

    #[test]
    fn limit_stops_after_enough_records() {
        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("lemmatized.txt");

        let input = "[[alfa]] [[beta]] [[gama]]\n";
        let pipeline = SequentialPipeline::new(dir.path().join("work"), true, Some(2));
        let stats = pipeline
            .run(Cursor::new(input), &output_path, &StopWordSet::default())
            .unwrap();

        assert_eq!(stats.records_written(), 2);
        let output = fs::read_to_string(&output_path).unwrap();
        assert_eq!(output, "alfa\nbeta\n");
    }
}
