use clap::{Args, Parser, Subcommand};
use codal_watch::config::AppConfig;
use codal_watch::error::AppError;
use codal_watch::telemetry;
use codal_watch::workflows::codal::client::{
    CodalSearchClient, DetailPageEnricher, HttpTransport, PopplerRenderer,
};
use codal_watch::workflows::codal::{AggregateResult, LetterCodeTaxonomy, ReconciliationEngine};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

type CodalEngine = ReconciliationEngine<CodalSearchClient, DetailPageEnricher, PopplerRenderer>;

#[derive(Parser, Debug)]
#[command(
    name = "codal-watch",
    about = "Detect new Codal announcements and reconcile them with their filing history",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single detection cycle (default command)
    Check(CheckArgs),
    /// Poll the search API and run a cycle on every tick
    Watch(WatchArgs),
    /// Print the configured letter-code walk order
    Taxonomy,
}

#[derive(Args, Debug, Default)]
struct CheckArgs {
    /// Also write the full result, image included, to this file
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct WatchArgs {
    /// Seconds between cycles (defaults to CODAL_POLL_INTERVAL_SECS)
    #[arg(long)]
    interval_secs: Option<u64>,
    /// Stop after this many cycles
    #[arg(long)]
    max_cycles: Option<u64>,
    /// Save each new result as <tracing_no>.json in this directory
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Check(CheckArgs::default()));

    let config = AppConfig::load()?;

    match command {
        Command::Check(args) => {
            telemetry::init(&config.telemetry)?;
            let mut engine = build_engine(&config)?;
            run_check(&mut engine, args)
        }
        Command::Watch(args) => {
            telemetry::init(&config.telemetry)?;
            let mut engine = build_engine(&config)?;
            let interval = args
                .interval_secs
                .map(Duration::from_secs)
                .unwrap_or(config.watch.poll_interval);
            run_watch(&mut engine, interval, args)
        }
        Command::Taxonomy => {
            print_taxonomy(&config.codal.taxonomy);
            Ok(())
        }
    }
}

fn build_engine(config: &AppConfig) -> Result<CodalEngine, AppError> {
    let transport = Arc::new(HttpTransport::new(config.codal.http_settings())?);
    let source = Arc::new(CodalSearchClient::new(transport.clone()));
    let enricher = Arc::new(DetailPageEnricher::new(transport.clone()));
    let renderer = Arc::new(PopplerRenderer::new(
        transport,
        config.render.poppler_path.as_deref(),
    ));

    Ok(ReconciliationEngine::new(
        source,
        enricher,
        renderer,
        config.codal.reconciliation(),
    ))
}

fn run_check(engine: &mut CodalEngine, args: CheckArgs) -> Result<(), AppError> {
    info!("starting codal checker");

    match engine.process_cycle() {
        Some(result) => {
            info!("successfully processed new announcement");
            print_result(&result)?;
            if let Some(path) = args.output {
                write_result(&result, &path)?;
            }
        }
        None => info!("no new announcements were processed"),
    }

    info!("codal checker finished");
    Ok(())
}

fn run_watch(
    engine: &mut CodalEngine,
    interval: Duration,
    args: WatchArgs,
) -> Result<(), AppError> {
    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)?;
    }

    info!(interval_secs = interval.as_secs(), "watching codal announcements");
    let mut cycle: u64 = 0;

    loop {
        cycle += 1;
        if let Some(result) = engine.process_cycle() {
            print_result(&result)?;
            if let Some(dir) = &args.output_dir {
                let path = dir.join(format!("{}.json", result.latest_announcement.tracing_no()));
                write_result(&result, &path)?;
            }
        }

        if args.max_cycles.is_some_and(|max| cycle >= max) {
            info!(cycles = cycle, "reached cycle limit");
            return Ok(());
        }

        std::thread::sleep(interval);
    }
}

fn print_result(result: &AggregateResult) -> Result<(), AppError> {
    println!("{}", result.to_summary_json()?);
    Ok(())
}

fn write_result(result: &AggregateResult, path: &Path) -> Result<(), AppError> {
    std::fs::write(path, result.to_full_json()?)?;
    info!(path = %path.display(), "wrote full result");
    Ok(())
}

fn print_taxonomy(taxonomy: &LetterCodeTaxonomy) {
    println!("Letter-code walk order");
    for (index, code) in taxonomy.codes().iter().enumerate() {
        let note = if taxonomy.is_exempt(code) {
            " (exempt from DPM check)"
        } else {
            ""
        };
        println!("{:>2}. {}{}", index + 1, code, note);
    }
}
