//! Partitioned execution backend.
//!
//! Input lines are gathered into batches and split across worker threads;
//! each worker runs the fused parse-clean-tokenize transform over its
//! partition with no intermediate artifacts. Within a partition record
//! order is preserved; partitions are written back in partition order. The
//! stop-word set is broadcast read-only behind an `Arc`.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::pipeline::{self, LemmaPairRecord, RunStats};
use crate::tokens::StopWordSet;

/// Configuration for partitioned processing.
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Number of worker threads.
    pub num_threads: usize,
    /// Lines gathered before a batch is dispatched to the workers.
    pub batch_size: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        let cpus = thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4);
        Self {
            num_threads: cpus,
            batch_size: 1000,
        }
    }
}

/// Everything one partition produced, in partition-local order.
#[derive(Debug, Default)]
struct PartitionOutput {
    records: Vec<LemmaPairRecord>,
    records_parsed: usize,
    records_cleaned: usize,
    token_count_mismatches: usize,
}

/// Runs the fused pipeline over batches of input lines with a thread pool,
/// writing records as each batch completes.
pub fn process_batch_parallel<W: Write>(
    reader: impl BufRead,
    writer: &mut W,
    stop_words: &Arc<StopWordSet>,
    config: &ParallelConfig,
    limit: Option<usize>,
) -> io::Result<RunStats> {
    let start_time = Instant::now();
    let mut stats = RunStats::default();
    let mut batch: Vec<String> = Vec::with_capacity(config.batch_size);

    for line in reader.lines() {
        let line = line?;
        stats.lines_read += 1;
        batch.push(line);

        if batch.len() >= config.batch_size {
            let outputs = process_partitions(std::mem::take(&mut batch), stop_words, config);
            if write_outputs(outputs, writer, &mut stats, limit)? {
                stats.elapsed = start_time.elapsed();
                return Ok(stats);
            }
        }
    }

    if !batch.is_empty() {
        let outputs = process_partitions(batch, stop_words, config);
        write_outputs(outputs, writer, &mut stats, limit)?;
    }

    writer.flush()?;
    stats.elapsed = start_time.elapsed();
    Ok(stats)
}

/// Splits a batch into one partition per thread and processes partitions
/// independently. Joining in spawn order keeps partition order stable.
fn process_partitions(
    lines: Vec<String>,
    stop_words: &Arc<StopWordSet>,
    config: &ParallelConfig,
) -> Vec<PartitionOutput> {
    if lines.is_empty() {
        return vec![];
    }

    let num_threads = config.num_threads.min(lines.len()).max(1);
    let chunk_size = (lines.len() + num_threads - 1) / num_threads;

    let mut partitions: Vec<Vec<String>> = Vec::with_capacity(num_threads);
    let mut lines = lines.into_iter();
    loop {
        let partition: Vec<String> = lines.by_ref().take(chunk_size).collect();
        if partition.is_empty() {
            break;
        }
        partitions.push(partition);
    }

    let handles: Vec<JoinHandle<PartitionOutput>> = partitions
        .into_iter()
        .map(|partition| {
            let stop_words = Arc::clone(stop_words);
            thread::spawn(move || {
                let mut output = PartitionOutput::default();
                for line in &partition {
                    let outcome = pipeline::lemmatize_line(line, &stop_words);
                    output.records_parsed += outcome.records_parsed;
                    output.records_cleaned += outcome.records_cleaned;
                    output.token_count_mismatches += outcome.token_count_mismatches;
                    output.records.extend(outcome.records);
                }
                output
            })
        })
        .collect();

    handles
        .into_iter()
        .filter_map(|handle| handle.join().ok())
        .collect()
}

/// Writes partition outputs in order. Returns true once the record limit is
/// reached.
fn write_outputs<W: Write>(
    outputs: Vec<PartitionOutput>,
    writer: &mut W,
    stats: &mut RunStats,
    limit: Option<usize>,
) -> io::Result<bool> {
    for output in outputs {
        stats.records_parsed += output.records_parsed;
        stats.records_cleaned += output.records_cleaned;
        stats.token_count_mismatches += output.token_count_mismatches;

        for record in output.records {
            writeln!(writer, "{}", record.to_line())?;
            if record.non_lemma.is_some() {
                stats.pairs_written += 1;
            } else {
                stats.lemmas_written += 1;
            }

            if let Some(limit) = limit {
                if stats.records_written() >= limit {
                    writer.flush()?;
                    return Ok(true);
                }
            }
        }
    }

    Ok(false)
}
