use bzip2::read::BzDecoder;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod distance;
mod index;
mod markup;
mod normalize;
mod parallel;
mod pipeline;
mod tokens;

use index::{CorpusStatistics, LemmaIndex, NonLemmaIndex};
use parallel::{process_batch_parallel, ParallelConfig};
use pipeline::{RunStats, SequentialPipeline};
use tokens::StopWordSet;

/// Execution backend for the lemmatization pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// Single-threaded, stage by stage, with persisted intermediate artifacts
    Sequential,
    /// Fused per-record transform over line partitions on worker threads
    BatchParallel,
}

#[derive(Parser)]
#[command(name = "sk-wiki-lemmatizer")]
#[command(about = "Extracts a lemma/non-lemma dictionary from Slovak wiki markup dumps")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the three-stage lemmatization pipeline over a markup dump
    Lemmatize {
        /// Input markup file (plain text or .bz2)
        input: PathBuf,

        /// Output dictionary file, one lemma or lemma|non_lemma per line
        output: PathBuf,

        /// Stop-word list, one word per line
        #[arg(long, default_value = "stop_words.txt")]
        stop_words: PathBuf,

        /// Processing strategy
        #[arg(short, long, value_enum, default_value_t = Strategy::Sequential)]
        strategy: Strategy,

        /// Worker threads for batch-parallel (0 = auto-detect)
        #[arg(short, long, default_value_t = 0)]
        threads: usize,

        /// Lines per batch for batch-parallel
        #[arg(long, default_value_t = 1000)]
        batch_size: usize,

        /// Directory for the parsed/cleaned intermediate artifacts
        #[arg(long, default_value = "data")]
        work_dir: PathBuf,

        /// Stop after this many output records (for testing)
        #[arg(long)]
        limit: Option<usize>,

        /// Write the run counters as JSON
        #[arg(long)]
        stats_json: Option<PathBuf>,

        /// Quiet mode - minimal output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Report corpus statistics over a produced dictionary file
    Stats {
        /// Dictionary file produced by `lemmatize`
        input: PathBuf,

        /// How many of the most frequent lemmas to list
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Write the statistics as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Look up query terms in a produced dictionary file
    Lookup {
        /// Dictionary file produced by `lemmatize`
        input: PathBuf,

        /// Query terms
        query: Vec<String>,

        /// Index surface forms instead of lemmas
        #[arg(long)]
        by_non_lemma: bool,
    },
}

fn open_input(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    Ok(if path.to_string_lossy().ends_with(".bz2") {
        Box::new(BufReader::with_capacity(256 * 1024, BzDecoder::new(file)))
    } else {
        Box::new(BufReader::with_capacity(256 * 1024, file))
    })
}

#[allow(clippy::too_many_arguments)]
fn run_lemmatize(
    input: PathBuf,
    output: PathBuf,
    stop_words: PathBuf,
    strategy: Strategy,
    threads: usize,
    batch_size: usize,
    work_dir: PathBuf,
    limit: Option<usize>,
    stats_json: Option<PathBuf>,
    quiet: bool,
) -> io::Result<()> {
    let stop_words = StopWordSet::load(&stop_words)?;

    if !quiet {
        println!("Input: {}", input.display());
        println!("Output: {}", output.display());
        println!("Strategy: {:?}", strategy);
        println!("Stop words: {}", stop_words.len());
        if let Some(limit) = limit {
            println!("Limit: {} records", limit);
        }
        println!();
    }

    let reader = open_input(&input)?;

    let stats = match strategy {
        Strategy::Sequential => {
            SequentialPipeline::new(work_dir, quiet, limit).run(reader, &output, &stop_words)?
        }
        Strategy::BatchParallel => {
            let defaults = ParallelConfig::default();
            let config = ParallelConfig {
                num_threads: if threads == 0 {
                    defaults.num_threads
                } else {
                    threads
                },
                batch_size,
            };
            let mut writer = BufWriter::with_capacity(256 * 1024, File::create(&output)?);
            process_batch_parallel(reader, &mut writer, &Arc::new(stop_words), &config, limit)?
        }
    };

    if !quiet {
        print_run_report(&stats);
    }

    if let Some(path) = stats_json {
        serde_json::to_writer_pretty(File::create(path)?, &stats)?;
    }

    Ok(())
}

fn print_run_report(stats: &RunStats) {
    println!("============================================================");
    println!("Lines read: {}", stats.lines_read);
    println!("Records parsed: {}", stats.records_parsed);
    println!("Records cleaned: {}", stats.records_cleaned);
    println!("Bare lemmas written: {}", stats.lemmas_written);
    println!("Lemma|non-lemma pairs written: {}", stats.pairs_written);
    println!(
        "Link/anchor token count mismatches: {}",
        stats.token_count_mismatches
    );
    println!(
        "Time: {}m {}s",
        stats.elapsed.as_secs() / 60,
        stats.elapsed.as_secs() % 60
    );
    println!("============================================================");
}

fn run_stats(input: PathBuf, top: usize, json: Option<PathBuf>) -> io::Result<()> {
    let stats = CorpusStatistics::compute(open_input(&input)?)?;
    let report = stats.report(top);

    println!("Number of unique words: {}", report.unique_word_count);
    println!("Number of unique lemmas: {}", report.unique_lemma_count);
    println!(
        "Number of unique non-lemmas: {}",
        report.unique_non_lemma_count
    );

    if !report.top_lemmas.is_empty() {
        println!("Most frequent lemmas:");
        for (lemma, count) in &report.top_lemmas {
            println!("  {}: {}", lemma, count);
        }
    }

    if let Some(path) = json {
        serde_json::to_writer_pretty(File::create(path)?, &report)?;
    }

    Ok(())
}

fn run_lookup(input: PathBuf, query: Vec<String>, by_non_lemma: bool) -> io::Result<()> {
    let query = query.join(" ");

    if by_non_lemma {
        let index = NonLemmaIndex::build(open_input(&input)?)?;
        for (term, lemma) in index.lookup(&query) {
            if let Some(lemma) = lemma {
                println!("Non-lemma: {}, lemma: {}", term, lemma);
            }
        }
    } else {
        let index = LemmaIndex::build(open_input(&input)?)?;
        for (term, forms) in index.lookup(&query) {
            if let Some(forms) = forms {
                let forms: Vec<&str> = forms.iter().map(String::as_str).collect();
                println!("Lemma: {}, non-lemmas: {{{}}}", term, forms.join(", "));
            }
        }
    }

    Ok(())
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Lemmatize {
            input,
            output,
            stop_words,
            strategy,
            threads,
            batch_size,
            work_dir,
            limit,
            stats_json,
            quiet,
        } => run_lemmatize(
            input, output, stop_words, strategy, threads, batch_size, work_dir, limit, stats_json,
            quiet,
        ),
        Command::Stats { input, top, json } => run_stats(input, top, json),
        Command::Lookup {
            input,
            query,
            by_non_lemma,
        } => run_lookup(input, query, by_non_lemma),
    }
}
