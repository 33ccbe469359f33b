use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use env_logger::Env;
use featbin::config::{DEFAULT_OFFSET, DEFAULT_PROGRESS_INTERVAL, DEFAULT_SENTINEL};
use featbin::input::{read_lines, STDIN_PATH};
use featbin::{inspect, BinarizeConfig, Decoder, Driver, OutputPaths};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

/// Lines between spinner refreshes.
const PROGRESS_REFRESH_LINES: u64 = 4096;

#[derive(Parser, Debug)]
#[command(author, version, about = "Tab-separated feature file binarizer", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode a feature file into <BASE>.bin, <BASE>.svocab and <BASE>.lvocab
    Encode(EncodeArgs),
    /// Rebuild tab-separated text from an encoded file and its vocabularies
    Decode(DecodeArgs),
    /// Summarise an encoded file and verify it against its vocabularies
    Info(InfoArgs),
}

#[derive(Args, Debug, Clone)]
struct LayoutArgs {
    /// Value added to every vocabulary id
    #[arg(long, value_name = "N", default_value_t = DEFAULT_OFFSET)]
    offset: i32,

    /// Integer terminating each record
    #[arg(long, value_name = "N", default_value_t = DEFAULT_SENTINEL)]
    sentinel: i32,
}

impl LayoutArgs {
    fn config(&self, progress_interval: u64) -> Result<BinarizeConfig> {
        BinarizeConfig::builder()
            .offset(self.offset)
            .sentinel(self.sentinel)
            .progress_interval(progress_interval)
            .build()
            .context("invalid binary layout")
    }
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Feature file to encode ("-" reads standard input)
    input: PathBuf,

    /// Base name for the outputs (defaults to the input path)
    #[arg(short, long = "output-base", value_name = "BASE")]
    output_base: Option<PathBuf>,

    #[command(flatten)]
    layout: LayoutArgs,

    /// Blank lines between progress notices (0 disables them)
    #[arg(long, value_name = "COUNT", default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    progress_interval: u64,

    /// Show a spinner while encoding
    #[arg(long)]
    progress: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Base name of the encoded file and vocabularies
    base: PathBuf,

    /// Write decoded text here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    #[command(flatten)]
    layout: LayoutArgs,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Base name of the encoded file and vocabularies
    base: PathBuf,

    #[command(flatten)]
    layout: LayoutArgs,

    /// Emit JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Encode(args) => run_encode(args),
        Commands::Decode(args) => run_decode(args),
        Commands::Info(args) => run_info(args),
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    use log::LevelFilter;

    let level = if quiet > 0 {
        match quiet {
            1 => LevelFilter::Warn,
            _ => LevelFilter::Error,
        }
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    builder.filter_level(level);
    let _ = builder.try_init();
}

fn run_encode(args: EncodeArgs) -> Result<()> {
    let cfg = args.layout.config(args.progress_interval)?;
    let base = match (&args.output_base, args.input.as_os_str() == STDIN_PATH) {
        (Some(base), _) => base.clone(),
        (None, false) => args.input.clone(),
        (None, true) => return Err(anyhow!("--output-base is required when reading stdin")),
    };

    let driver = Driver::new(cfg, &base)?;
    let lines = read_lines(&args.input)
        .with_context(|| format!("failed to open input {}", args.input.display()))?;

    let spinner = if args.progress {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} encoded {pos} lines... {elapsed}")
            .context("invalid progress template")?
            .tick_chars("|/-\\ ");
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    } else {
        None
    };

    let summary = driver
        .run_with(lines, |stats| {
            if let Some(pb) = &spinner {
                if stats.lines % PROGRESS_REFRESH_LINES == 0 {
                    pb.set_position(stats.lines);
                }
            }
        })
        .with_context(|| format!("failed to encode {}", args.input.display()))?;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    info!(
        "encoded {} lines in {:.2}s",
        summary.stats.lines,
        summary.elapsed.as_secs_f64()
    );
    if args.json {
        println!("{}", summary.to_json_pretty()?);
    }
    Ok(())
}

fn run_decode(args: DecodeArgs) -> Result<()> {
    let layout = args.layout.config(0)?;
    let decoder = Decoder::from_base(&args.base, layout)
        .with_context(|| format!("failed to load vocabularies for {}", args.base.display()))?;
    let paths = OutputPaths::from_base(&args.base);
    let input = File::open(&paths.bin)
        .with_context(|| format!("failed to open {}", paths.bin.display()))?;
    let input = io::BufReader::new(input);

    let records = if let Some(path) = &args.output {
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        decoder
            .decode_stream(input, BufWriter::new(file))
            .with_context(|| format!("failed to decode {}", paths.bin.display()))?
    } else {
        let stdout = io::stdout();
        let mut handle = BufWriter::new(stdout.lock());
        let records = decoder
            .decode_stream(input, &mut handle)
            .with_context(|| format!("failed to decode {}", paths.bin.display()))?;
        handle.flush()?;
        records
    };
    info!("decoded {records} records from {}", paths.bin.display());
    Ok(())
}

fn run_info(args: InfoArgs) -> Result<()> {
    let layout = args.layout.config(0)?;
    let report = inspect(&args.base, &layout)
        .with_context(|| format!("failed to inspect {}", args.base.display()))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}
