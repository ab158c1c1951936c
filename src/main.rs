use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use graphpeak::io::{read_graph_file, read_intervals_file, write_peaks, write_pileup};
use graphpeak::pileup::{fragment_pileup, PileupStrategy};
use graphpeak::pipeline::{
    CallPeaks, ExperimentInfo, PeakCallConfig, DEFAULT_FRAGMENT_LENGTH, DEFAULT_Q_VALUE_CUTOFF,
    DEFAULT_READ_LENGTH,
};

#[derive(Parser, Debug)]
#[command(name = "graphpeak", about = "ChIP-seq peak calling on pangenome graphs")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Call peaks from treatment reads, optionally against a control.
    Call {
        /// Graph file (`N id length` / `E from to` records).
        graph: PathBuf,
        /// Treatment reads (`start end n1,n2,...` per line).
        sample: PathBuf,
        /// Control reads, same format. Without one the sample's own
        /// smoothed depth serves as control.
        control: Option<PathBuf>,
        /// Expected fragment length.
        #[arg(long, default_value_t = DEFAULT_FRAGMENT_LENGTH)]
        fragment_length: u32,
        /// Expected read length.
        #[arg(long, default_value_t = DEFAULT_READ_LENGTH)]
        read_length: u32,
        /// q-value cutoff.
        #[arg(long, default_value_t = DEFAULT_Q_VALUE_CUTOFF)]
        q_value: f64,
        /// Drop invalid reads instead of failing.
        #[arg(long)]
        skip_invalid: bool,
        /// Trim zero-coverage ends off reported paths.
        #[arg(long)]
        trim: bool,
        /// Do not floor the control at the genome-wide background.
        #[arg(long)]
        no_background: bool,
        /// Local control window; repeat to give several (default 2500 and 5000).
        #[arg(long = "local-window")]
        local_windows: Vec<u32>,
        /// Pileup strategy.
        #[arg(long, value_enum, default_value_t = Strategy::Sweep)]
        strategy: Strategy,
        /// Output file (stdout when omitted).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Write the fragment pileup of a read set.
    Pileup {
        /// Graph file.
        graph: PathBuf,
        /// Reads file.
        reads: PathBuf,
        /// Expected fragment length.
        #[arg(long, default_value_t = DEFAULT_FRAGMENT_LENGTH)]
        fragment_length: u32,
        /// Pileup strategy.
        #[arg(long, value_enum, default_value_t = Strategy::Sweep)]
        strategy: Strategy,
        /// Output file (stdout when omitted).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Strategy {
    Sweep,
    Extender,
}

impl From<Strategy> for PileupStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Sweep => PileupStrategy::Sweep,
            Strategy::Extender => PileupStrategy::Extender,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Call {
            graph,
            sample,
            control,
            fragment_length,
            read_length,
            q_value,
            skip_invalid,
            trim,
            no_background,
            local_windows,
            strategy,
            output,
        } => {
            let mut config = PeakCallConfig::default()
                .with_q_value_cutoff(q_value)
                .with_skip_read_validation(skip_invalid)
                .with_trim_max_paths(trim)
                .with_background(!no_background)
                .with_control(control.is_some())
                .with_strategy(strategy.into());
            if !local_windows.is_empty() {
                config = config.with_local_windows(local_windows);
            }
            run_call(graph, sample, control, fragment_length, read_length, config, output)?
        }
        Commands::Pileup {
            graph,
            reads,
            fragment_length,
            strategy,
            output,
        } => run_pileup(graph, reads, fragment_length, strategy.into(), output)?,
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open_output(output: Option<PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(BufWriter::new(File::create(&path).with_context(|| {
            format!("failed to create output file {}", path.display())
        })?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

fn run_call(
    graph_path: PathBuf,
    sample_path: PathBuf,
    control_path: Option<PathBuf>,
    fragment_length: u32,
    read_length: u32,
    config: PeakCallConfig,
    output: Option<PathBuf>,
) -> Result<()> {
    let graph = read_graph_file(&graph_path)?;
    let sample = read_intervals_file(&sample_path)?;
    let control = match control_path {
        Some(path) => read_intervals_file(&path)?,
        None => Vec::new(),
    };

    let info = ExperimentInfo::from_graph(&graph, fragment_length, read_length);
    let mut caller =
        CallPeaks::new(&graph, info, config).context("failed to initialise peak caller")?;
    let result = caller.run(sample, control).context("peak calling failed")?;
    if result.unscored_regions > 0 {
        tracing::warn!(regions = result.unscored_regions, "some regions could not be scored");
    }

    let mut writer = open_output(output)?;
    write_peaks(&mut writer, &result.peaks)
}

fn run_pileup(
    graph_path: PathBuf,
    reads_path: PathBuf,
    fragment_length: u32,
    strategy: PileupStrategy,
    output: Option<PathBuf>,
) -> Result<()> {
    let graph = read_graph_file(&graph_path)?;
    let reads = read_intervals_file(&reads_path)?;
    let dense = fragment_pileup(&graph, &reads, fragment_length, strategy, true)
        .context("failed to build pileup")?;
    let pileup = dense.to_pileup();

    let mut writer = open_output(output)?;
    write_pileup(&mut writer, &graph, &pileup)
}
