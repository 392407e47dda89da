// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! ringlog — operator tool for inspecting a ring-buffer log file.
//!
//! Usage:
//!   ringlog <NAME> -r 100 -g 3 -c 0 1 --print-pid --print-level

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ringlog::Reader;

#[derive(Parser)]
#[command(name = "ringlog", about = "Ring-buffer log reader/operator tool", version)]
struct Cli {
    /// Logical log name (resolved via RINGLOG_DIR / suffix rules).
    name: String,

    /// Maximum number of records to print (0 = unbounded).
    #[arg(short = 'r', long = "record", default_value_t = 0)]
    record: usize,

    /// Only print records with level <= L.
    #[arg(short = 'g', long = "level", default_value_t = 7)]
    level: u8,

    /// Allow-list of category ids (empty = all).
    #[arg(short = 'c', long = "category", num_args = 0.., value_delimiter = ' ')]
    category: Vec<u8>,

    /// Allow-list of process ids (empty = all).
    #[arg(short = 'p', long = "pid", num_args = 0.., value_delimiter = ' ')]
    pid: Vec<u32>,

    /// Allow-list of thread ids (empty = all).
    #[arg(short = 't', long = "thread", num_args = 0.., value_delimiter = ' ')]
    thread: Vec<u32>,

    /// Inclusive order range: BEG [END].
    #[arg(short = 's', long = "order", num_args = 1..=2)]
    order: Vec<u64>,

    /// Inclusive wall-clock range: BEG [END], "%Y-%m-%dT%H:%M:%S".
    #[arg(short = 'd', long = "date", num_args = 1..=2)]
    date: Vec<String>,

    /// Reset the record counter after printing.
    #[arg(long = "clear")]
    clear: bool,

    #[arg(long = "print-category")]
    print_category: bool,

    #[arg(long = "print-level")]
    print_level: bool,

    #[arg(long = "print-pid")]
    print_pid: bool,

    #[arg(long = "print-minidata")]
    print_minidata: bool,

    #[arg(long = "print-thread-name")]
    print_thread_name: bool,

    #[arg(long = "print-source")]
    print_source: bool,

    /// strftime-style format for the timestamp column.
    #[arg(long = "date-format", default_value = "%Y-%m-%d %H:%M:%S%.6f")]
    date_format: String,
}

fn parse_date(s: &str) -> Result<i64> {
    let dt = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .with_context(|| format!("invalid date '{s}', expected %Y-%m-%dT%H:%M:%S"))?;
    Ok(dt.and_utc().timestamp_micros())
}

fn run(cli: Cli) -> Result<()> {
    let reader = Reader::load(&cli.name).with_context(|| format!("loading log '{}'", cli.name))?;

    let order_min = cli.order.first().copied().unwrap_or(0) as u32;
    let order_max = cli.order.get(1).copied().unwrap_or(u32::MAX as u64) as u32;

    let time_us_min = match cli.date.first() {
        Some(s) => parse_date(s)?,
        None => 0,
    };
    let time_us_max = match cli.date.get(1) {
        Some(s) => parse_date(s)?,
        None => i64::MAX,
    };

    let categories = cli.category.clone();
    let pids = cli.pid.clone();
    let threads = cli.thread.clone();
    let level_max = cli.level;

    reader.scan(
        cli.record,
        order_min,
        time_us_min,
        |info| {
            if !threads.is_empty() && !threads.contains(&info.th_id) {
                return false;
            }
            if !pids.is_empty() && !pids.contains(&info.pid) {
                return false;
            }
            info.time_us <= time_us_max
                && info.order <= order_max
                && info.level <= level_max
                && (categories.is_empty() || categories.contains(&info.category))
        },
        |info, payload| {
            print_record(&cli, info, payload);
            true
        },
    );

    if cli.clear {
        ringlog::writer::clear_by_name(&cli.name)?;
    }

    Ok(())
}

fn print_record(cli: &Cli, info: &ringlog::RecordInfo, payload: &[u8]) {
    let mut prefix = format!("{:>4} ", info.order);

    let ts = chrono::DateTime::from_timestamp_micros(info.time_us).unwrap_or_default();
    prefix.push_str(&ts.format(&cli.date_format).to_string());

    if cli.print_thread_name {
        prefix.push_str(&format!(" {}", info.thread_name));
    } else {
        prefix.push_str(&format!(" @{:x}", info.th_id));
    }

    if cli.print_pid {
        prefix.push_str(&format!("/{:06}", info.pid));
    }

    if cli.print_source && !info.source_name.is_empty() {
        prefix.push_str(&format!(" {}:{}", info.source_name, info.src_line));
    }

    match (cli.print_category, cli.print_level) {
        (true, true) => prefix.push_str(&format!(" [{}:{}]", info.category, info.level)),
        (true, false) => prefix.push_str(&format!(" [{}]", info.category)),
        (false, true) => prefix.push_str(&format!(" [{}]", info.level)),
        (false, false) => prefix.push(' '),
    }

    if cli.print_minidata {
        prefix.push_str(&format!(" ({:08x})", info.mini));
    }

    prefix.push_str(": ");
    println!("{}{}", prefix, String::from_utf8_lossy(payload));
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("ringlog: {e:#}");
        std::process::exit(1);
    }
}
