use std::io::{BufWriter, Write};

use anyhow::Result;
use clap::Parser;
use tracing::info;

use barpep::{
    Aggregator, FastqSource, FlankSpecBuilder, InsertScanner, ReadScanner, ScanReport,
    CHUNK_SIZE, DEFAULT_MARGIN,
};

/// Extract barcodes or peptide inserts between two constant flanks
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// FASTQ files to scan (optionally gzip/bzip2/xz/zstd compressed)
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Flanking sequence at the 5' side of the insert
    #[arg(short = 'l', long)]
    left: String,

    /// Flanking sequence at the 3' side of the insert
    #[arg(short = 'r', long)]
    right: String,

    /// Length of the insert in nucleotides
    #[arg(short = 's', long)]
    insert_size: usize,

    /// 0-based position of the first insert base on the forward strand
    #[arg(short = 'n', long)]
    loc: Option<usize>,

    /// Bases before and after the expected position to search for the insert
    #[arg(short = 'm', long, default_value_t = DEFAULT_MARGIN)]
    margin: usize,

    /// 0-based position of the first insert base on the reverse-complement strand
    #[arg(short = 'k', long)]
    loc_rc: Option<usize>,

    /// Number of threads (0: all logical CPUs)
    #[arg(short = 't', long, default_value_t = 1)]
    threads: usize,

    /// Reads held in memory per parallel chunk
    #[arg(long, default_value_t = CHUNK_SIZE)]
    chunk_size: usize,

    /// Only log warnings and errors
    #[arg(short = 'w', long)]
    silence: bool,
}

fn scan_file(path: &str, scanner: &InsertScanner, args: &Args) -> Result<ScanReport> {
    let mut source = FastqSource::from_path(path)?;
    if args.threads == 1 {
        let mut aggregator = Aggregator::new(scanner);
        source.for_each_read(|seq| aggregator.push(seq))?;
        Ok(aggregator.finish())
    } else {
        Ok(source.scan_chunked(scanner, args.threads, args.chunk_size)?)
    }
}

fn write_counts(report: &ScanReport) -> Result<()> {
    let mut out = BufWriter::new(std::io::stdout().lock());
    for (insert, count) in report.counts() {
        out.write_all(insert)?;
        writeln!(out, "\t{count}")?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.silence { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let spec = FlankSpecBuilder::new()
        .left(args.left.as_bytes())
        .right(args.right.as_bytes())
        .insert_size(args.insert_size)
        .loc(args.loc)
        .loc_rc(args.loc_rc)
        .margin(Some(args.margin))
        .build()?;
    let scanner = InsertScanner::new(spec);
    info!(mode = ?scanner.spec().mode(), "searching for inserts");

    for path in &args.inputs {
        let now = std::time::Instant::now();
        info!(path = %path, "processing sample");
        let report = scan_file(path, &scanner, &args)?;

        info!("Total number of reads: {}", report.read_count());
        info!(
            "Reads recovered: {} ({:.2}%)",
            report.recovered(),
            report.recovery_rate()
        );
        info!(
            "Reads with no constant region found: {}",
            report.miss_count()
        );
        if let Some(mean) = report.mean_length() {
            info!("Mean sequence length: {mean} bp");
        }
        info!("Elapsed time: {:?}", now.elapsed());

        write_counts(&report)?;
    }

    Ok(())
}
