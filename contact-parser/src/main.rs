use anyhow::{bail, Context};
use clap::Parser;
use contact_parser::config::load_country_table;
use contact_parser::contact::{
    extract_contact, normalize_phone, ContactRecord, ErrorBody, EventFields, Status,
};
use contact_parser::logging;
use contact_parser::normalizer::Normalizer;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::Utf8Error;
use std::time::Instant;
use tracing::{debug, info};

/// Extract contact records from calendar events
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File with one JSON event ({"summary", "description"}) per line
    #[arg(index = 1, required_unless_present = "phone")]
    file_path: Option<PathBuf>,

    /// Normalize a single phone number instead of reading a file
    #[arg(long, conflicts_with = "file_path")]
    phone: Option<String>,

    /// Process only first N lines (optional)
    #[arg(short, long)]
    limit: Option<usize>,

    /// Number of threads to use (default: 4)
    #[arg(short, long, default_value = "4")]
    threads: usize,

    /// Show a progress bar and write statistics for the processed events
    #[arg(short, long)]
    stats: bool,

    /// Where to write statistics
    #[arg(long, default_value = "contact_stats.json")]
    stats_output: PathBuf,

    /// JSON file replacing the built-in country table
    #[arg(long, env = "COUNTRY_TABLE")]
    country_table: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Default, Serialize)]
struct Stats {
    file_path: String,
    total_events: usize,
    by_status: BTreeMap<&'static str, usize>,
    by_error_kind: BTreeMap<String, usize>,
    by_line_type: BTreeMap<String, usize>,
}

impl Stats {
    fn record(&mut self, record: &ContactRecord) {
        self.total_events += 1;
        let status = match record.status {
            Status::Success => "success",
            Status::Error => "error",
        };
        *self.by_status.entry(status).or_insert(0) += 1;
        if let Some(error) = &record.error {
            *self.by_error_kind.entry(error.kind.clone()).or_insert(0) += 1;
        }
        if let Some(line_type) = &record.line_type {
            *self.by_line_type.entry(line_type.clone()).or_insert(0) += 1;
        }
    }
}

/// A line that failed UTF-8 decoding arrives as its decode error.
fn process_line(
    normalizer: &Normalizer<'_>,
    line: &Result<String, Utf8Error>,
) -> ContactRecord {
    let line = match line {
        Ok(line) => line,
        Err(err) => {
            debug!("skipping undecodable line: {}", err);
            return ContactRecord::failure(ErrorBody::new(
                "bad_request",
                format!("line is not valid UTF-8: {}", err),
            ));
        }
    };
    match serde_json::from_str::<EventFields>(line) {
        Ok(event) => extract_contact(normalizer, &event),
        Err(err) => {
            debug!("skipping malformed event: {}", err);
            ContactRecord::failure(ErrorBody::new(
                "bad_request",
                format!("invalid event JSON: {}", err),
            ))
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    logging::init(if args.verbose { "debug" } else { "warn" });

    let table = load_country_table(args.country_table.as_deref())
        .context("failed to load country table")?;
    let normalizer = Normalizer::new(&table);

    if let Some(phone) = &args.phone {
        let report = normalize_phone(&normalizer, phone);
        println!("{}", serde_json::to_string(&report)?);
        return Ok(if report.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let file_path = match &args.file_path {
        Some(path) => path,
        None => bail!("an input file or --phone is required"),
    };
    if args.threads == 0 {
        bail!("--threads must be at least 1");
    }

    let start = Instant::now();
    let file = File::open(file_path)
        .with_context(|| format!("failed to open {}", file_path.display()))?;
    let reader = BufReader::with_capacity(1_000_000, file);

    let limit = args.limit.unwrap_or(usize::MAX);
    let mut lines = Vec::new();
    for line_result in reader.split(b'\n').take(limit) {
        let mut bytes = line_result
            .with_context(|| format!("failed to read {}", file_path.display()))?;
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        match String::from_utf8(bytes) {
            Ok(line) if line.trim().is_empty() => {}
            Ok(line) => lines.push(Ok(line)),
            Err(err) => lines.push(Err(err.utf8_error())),
        }
    }
    info!("read {} events from {}", lines.len(), file_path.display());

    // Progress only in stats mode, as stdout carries the records
    let progress_bar = if args.stats {
        let pb = ProgressBar::new(lines.len() as u64);
        pb.set_style(ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} events ({eta})")?
            .progress_chars("#>-"));
        Some(pb)
    } else {
        None
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build()
        .context("failed to build thread pool")?;

    let records: Vec<ContactRecord> = pool.install(|| {
        lines
            .par_iter()
            .map(|line| {
                let record = process_line(&normalizer, line);
                if let Some(pb) = &progress_bar {
                    pb.inc(1);
                }
                record
            })
            .collect()
    });

    if let Some(pb) = &progress_bar {
        pb.finish_and_clear();
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut stats = Stats {
        file_path: file_path.display().to_string(),
        ..Stats::default()
    };
    for record in &records {
        writeln!(out, "{}", serde_json::to_string(record)?)?;
        stats.record(record);
    }
    out.flush()?;

    info!("processed {} events in {:?}", records.len(), start.elapsed());

    if args.stats {
        fs::write(&args.stats_output, serde_json::to_string_pretty(&stats)?)
            .with_context(|| format!("failed to write {}", args.stats_output.display()))?;
        eprintln!("Statistics written to {}", args.stats_output.display());
    }

    Ok(ExitCode::SUCCESS)
}
