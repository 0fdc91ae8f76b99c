use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ndarray::Array2;
use sketchnn::counter::CounterKind;
use sketchnn::stats::GraphStats;
use sketchnn::{extend, filter, io, lower_rank, utils};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of threads (0 = all available)
    #[arg(short, long, default_value_t = 1, global = true)]
    threads: usize,
    /// Verbosity, repeat for more (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count k-mers per sample and report how many pass the minimum count
    Count {
        /// File listing one FASTA path per line, relative to the list's directory
        #[arg(short, long)]
        input_list: PathBuf,
        /// K-mer size (<= 32)
        #[arg(short, long, default_value_t = 31)]
        k_size: usize,
        /// K-mers must be seen more than this many times
        #[arg(short, long, default_value_t = 2)]
        min_count: u8,
        /// Count exactly with a hash map instead of the fixed-size table
        #[arg(long)]
        exact: bool,
        /// Output table (stdout if not given)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Add query samples to a sparse kNN graph
    Extend {
        /// Existing sparse graph over the reference samples
        #[arg(short, long)]
        graph: PathBuf,
        /// Dense query x query distances
        #[arg(long)]
        qq: PathBuf,
        /// Dense reference x query distances
        #[arg(long)]
        qr: PathBuf,
        /// Number of reference samples. Required when there are no queries,
        /// since an empty reference x query file carries no row count
        #[arg(short, long)]
        references: Option<usize>,
        /// Distinct neighbour distances kept per sample
        #[arg(short, long)]
        knn: usize,
        /// Output sparse graph
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Cut a sparse kNN graph down to fewer neighbours
    Sparsify {
        /// Sparse graph to reduce
        #[arg(short, long)]
        graph: PathBuf,
        /// Number of samples (defaults to the largest index + 1)
        #[arg(short, long)]
        samples: Option<usize>,
        /// Distinct neighbour distances kept per sample
        #[arg(short, long)]
        knn: usize,
        /// Output sparse graph
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp_secs()
        .init();
}

fn run_count(
    input_list: PathBuf,
    k: usize,
    min_count: u8,
    exact: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    if k == 0 || k > sketchnn::kmer::MAX_K {
        bail!(
            "k-mer size must be between 1 and {}, got {}",
            sketchnn::kmer::MAX_K,
            k
        );
    }
    let paths = utils::read_fof(&input_list)?;
    let kind = if exact {
        CounterKind::Exact
    } else {
        CounterKind::CountMin
    };
    log::info!(
        "Counting k-mers in {} samples (k={}, min count={}, counter={:?})",
        paths.len(),
        k,
        min_count,
        kind
    );
    let all = filter::filter_samples(&paths, k, kind, min_count)?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(Vec::new());
    writer.write_record(["sample", "kmers", "passing", "distinct_passing"])?;
    for stats in &all {
        writer.write_record([
            stats.sample.clone(),
            stats.total_kmers.to_string(),
            stats.passing_kmers.to_string(),
            stats.distinct_passing.to_string(),
        ])?;
    }
    let table = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("build count table")?;
    match &output {
        Some(path) => {
            let mut out = io::OutputWriter::create(path)?;
            out.write_all(&table)
                .with_context(|| format!("write count table to {}", path.display()))?;
            out.finish()
                .with_context(|| format!("finish output {}", path.display()))?;
        }
        None => std::io::stdout()
            .write_all(&table)
            .context("write count table")?,
    }
    Ok(())
}

fn run_extend(
    graph: PathBuf,
    qq: PathBuf,
    qr: PathBuf,
    references: Option<usize>,
    knn: usize,
    output: PathBuf,
) -> Result<()> {
    let rr = io::read_sparse(&graph)?;
    let qq = io::read_dense(&qq)?;
    let mut qr = io::read_dense(&qr)?;
    if let Some(n) = references {
        if qr.is_empty() {
            qr = Array2::zeros((n, 0));
        } else if qr.nrows() != n {
            bail!(
                "reference x query matrix has {} rows but --references is {}",
                qr.nrows(),
                n
            );
        }
    }
    let (nr, nq) = qr.dim();
    if qq.dim() != (nq, nq) {
        bail!(
            "query x query matrix is {} x {}, expected {} x {} from the reference x query matrix",
            qq.nrows(),
            qq.ncols(),
            nq,
            nq
        );
    }
    if let Some(&max_idx) = rr.rows.iter().chain(&rr.cols).max() {
        if max_idx >= nr {
            bail!(
                "sparse graph refers to sample {} but only {} references were given",
                max_idx,
                nr
            );
        }
    }
    GraphStats::compute(&rr, nr).log("Reference graph");
    log::info!("Extending {} references with {} queries (kNN={})", nr, nq, knn);
    let extended = extend(&rr, qq.view(), qr.view(), knn);
    GraphStats::compute(&extended, nr + nq).log("Extended graph");
    io::write_sparse(&extended, &output)
}

fn run_sparsify(
    graph: PathBuf,
    samples: Option<usize>,
    knn: usize,
    output: PathBuf,
) -> Result<()> {
    let rr = io::read_sparse(&graph)?;
    let max_idx = rr.rows.iter().chain(&rr.cols).max().map_or(0, |&m| m + 1);
    let n_samples = samples.unwrap_or(max_idx);
    if n_samples < max_idx {
        bail!(
            "sparse graph refers to sample {} but --samples is {}",
            max_idx - 1,
            n_samples
        );
    }
    GraphStats::compute(&rr, n_samples).log("Input graph");
    let reduced = lower_rank(&rr, n_samples, knn);
    GraphStats::compute(&reduced, n_samples).log("Sparsified graph");
    io::write_sparse(&reduced, &output)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()
        .context("configure thread pool")?;

    match args.command {
        Command::Count {
            input_list,
            k_size,
            min_count,
            exact,
            output,
        } => run_count(input_list, k_size, min_count, exact, output),
        Command::Extend {
            graph,
            qq,
            qr,
            references,
            knn,
            output,
        } => run_extend(graph, qq, qr, references, knn, output),
        Command::Sparsify {
            graph,
            samples,
            knn,
            output,
        } => run_sparsify(graph, samples, knn, output),
    }
}
