//! thetapart CLI: partition a join matrix, audit an exported partitioning,
//! inspect a matrix directory.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use thetapart_core::config::PartitionerConfig;
use thetapart_core::hash::hash_matrix;
use thetapart_core::partition::CostKind;
use thetapart_exec::replay::check_partitioning_dir;
use thetapart_exec::{Engine, JobSpec, Policy, SearchPolicy};
use thetapart_io::writers::matrix::matrix_properties;
use thetapart_io::MatrixDir;

#[derive(Parser)]
#[command(name = "thetapart")]
#[command(about = "Theta-join matrix partitioning under a partition budget", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a threshold and export the partitioning
    Partition {
        /// Matrix directory (pm.csv, boundaries.csv, counts.csv)
        #[arg(short, long)]
        matrix: Option<PathBuf>,

        /// Output directory for the partitioning files
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// YAML job file; flags below override it
        #[arg(short, long)]
        job: Option<PathBuf>,

        /// rect, jaccard, manhattan, added-input-max, added-cells-max,
        /// added-input-sum, emptiest-input, emptiest-cells, weighted:<r>:<c>
        #[arg(long)]
        policy: Option<Policy>,

        /// Partition budget
        #[arg(short = 'p', long, env = "THETAPART_NUM_PARTITIONS")]
        partitions: Option<usize>,

        /// input-cost or candidate-cells
        #[arg(long)]
        cost_kind: Option<CostKind>,

        /// Run a range search after the binary search
        #[arg(long)]
        range: bool,

        /// Range search upper factor
        #[arg(long)]
        upper_factor: Option<f64>,

        /// Range search sample count
        #[arg(long)]
        granularity: Option<usize>,

        /// Weight set `name=w,name=w`; repeat for several
        #[arg(long = "weights")]
        weights: Vec<String>,
    },

    /// Check an exported partitioning against its matrix
    Validate {
        #[arg(short, long)]
        matrix: PathBuf,

        /// Directory holding histogramIndexToPartitionsMapping.csv and
        /// partitionsInputCost.csv
        #[arg(long)]
        partitioning: PathBuf,
    },

    /// Print matrix properties and digest as JSON
    Inspect {
        #[arg(short, long)]
        matrix: PathBuf,
    },
}

struct PartitionArgs {
    matrix: Option<PathBuf>,
    out: Option<PathBuf>,
    job: Option<PathBuf>,
    policy: Option<Policy>,
    partitions: Option<usize>,
    cost_kind: Option<CostKind>,
    range: bool,
    upper_factor: Option<f64>,
    granularity: Option<usize>,
    weights: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Partition {
            matrix,
            out,
            job,
            policy,
            partitions,
            cost_kind,
            range,
            upper_factor,
            granularity,
            weights,
        } => {
            let args = PartitionArgs {
                matrix,
                out,
                job,
                policy,
                partitions,
                cost_kind,
                range,
                upper_factor,
                granularity,
                weights,
            };
            if let Err(e) = run_partition(args) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Validate {
            matrix,
            partitioning,
        } => match run_validate(&matrix, &partitioning) {
            Ok(true) => println!("✓ Partitioning is consistent"),
            Ok(false) => std::process::exit(2),
            Err(e) => {
                eprintln!("Validation failed: {}", e);
                std::process::exit(1);
            }
        },
        Commands::Inspect { matrix } => {
            if let Err(e) = run_inspect(&matrix) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

/// Flags win over the job file, which wins over `THETAPART_*` defaults.
fn apply_overrides(job: &mut JobSpec, args: &PartitionArgs) {
    if let Some(p) = &args.matrix {
        job.matrix_dir = Some(p.clone());
    }
    if let Some(p) = &args.out {
        job.output_dir = Some(p.clone());
    }
    if let Some(policy) = args.policy {
        job.policy = policy;
    }
    if args.partitions.is_some() {
        job.num_partitions = args.partitions;
    }
    if args.cost_kind.is_some() {
        job.cost_kind = args.cost_kind;
    }

    let wants_range = args.range
        || args.upper_factor.is_some()
        || args.granularity.is_some()
        || !args.weights.is_empty();
    if !wants_range {
        return;
    }
    if job.search == SearchPolicy::Binary {
        job.search = SearchPolicy::Range {
            upper_factor: None,
            granularity: None,
            weights: Vec::new(),
        };
    }
    if let SearchPolicy::Range {
        upper_factor,
        granularity,
        weights,
    } = &mut job.search
    {
        if args.upper_factor.is_some() {
            *upper_factor = args.upper_factor;
        }
        if args.granularity.is_some() {
            *granularity = args.granularity;
        }
        if !args.weights.is_empty() {
            *weights = args.weights.clone();
        }
    }
}

fn run_partition(args: PartitionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut job = match &args.job {
        Some(path) => JobSpec::from_path(path)?,
        None => JobSpec::default(),
    };
    apply_overrides(&mut job, &args);

    let matrix_dir = job
        .matrix_dir
        .clone()
        .ok_or("no matrix directory (use --matrix or matrix_dir in the job)")?;
    let m = MatrixDir::new(&matrix_dir).load()?;
    info!(
        matrix = %matrix_dir.display(),
        buckets_s = m.buckets_s(),
        buckets_t = m.buckets_t(),
        candidate_cells = m.candidate_cell_count(),
        "matrix loaded"
    );

    let engine = Engine::new(PartitionerConfig::from_env());
    let report = engine.run(&m, &job)?;

    println!("✓ Partitioning finished");
    println!("  Policy: {}", report.policy);
    println!("  Threshold: {} ({})", report.threshold, report.cost_kind);
    println!(
        "  Partitions: {} of {}",
        report.partition_count, report.num_partitions
    );
    println!("  Probes: {}", report.probes);
    println!("  Duration: {}ms", report.finished_ms.saturating_sub(report.started_ms));
    if let Some(range) = &report.range {
        for sel in &range.selections {
            println!(
                "  Range pick [{}]: threshold {} score {:.4}",
                sel.weights, sel.threshold, sel.score
            );
        }
    }

    if let Some(out) = &job.output_dir {
        report.export(&m, out)?;
        println!("  Output: {}", out.display());
    }
    Ok(())
}

fn run_validate(matrix: &Path, partitioning: &Path) -> Result<bool, Box<dyn std::error::Error>> {
    let m = MatrixDir::new(matrix).load()?;
    let check = check_partitioning_dir(&m, partitioning)?;
    for c in &check.uncovered {
        eprintln!("uncovered candidate cell ({}, {})", c.row, c.col);
    }
    for c in &check.cost_mismatches {
        eprintln!(
            "partition {}: recorded input cost {} but buckets add up to {}",
            c.partition, c.recorded, c.actual
        );
    }
    for id in &check.unknown_partitions {
        eprintln!("partition {id} appears in only one of the files");
    }
    println!(
        "  Partitions: {}, max input cost: {}",
        check.partitions, check.max_input_cost
    );
    Ok(check.is_ok())
}

fn run_inspect(matrix: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let m = MatrixDir::new(matrix).load()?;
    let mut summary = serde_json::Map::new();
    for (k, v) in matrix_properties(&m).iter() {
        summary.insert(k.to_string(), serde_json::Value::String(v.to_string()));
    }
    summary.insert(
        "digest".into(),
        serde_json::Value::String(hash_matrix(&m).to_hex()),
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
