use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use proxy_batch::{
    logging,
    proxy::{DetailViewer, ExportOutcome, Orchestrator, ResultSet, SubmissionState},
    tui::BatchTesterApp,
    Config, DEFAULT_BACKEND_URL,
};
use std::io::Read;
use std::path::PathBuf;

/// Submit proxy batches to a remote tester and inspect the results
#[derive(Parser)]
#[command(name = "proxy-batch")]
#[command(about = "Submit proxy batches to a remote tester and inspect the results")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Tester endpoint receiving batch submissions
    #[arg(short, long, global = true, env = "PROXY_TESTER_URL", default_value = DEFAULT_BACKEND_URL)]
    backend: String,

    /// Directory CSV exports are written to
    #[arg(long, global = true, env = "PROXY_TESTER_EXPORT_DIR", default_value = ".")]
    export_dir: PathBuf,

    /// Write logs to this file (the TUI logs nowhere otherwise)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive TUI
    Tui {
        /// File to pre-fill the proxy list from
        input: Option<PathBuf>,
        /// Initial thread count
        #[arg(short = 'n', long, default_value = "10")]
        threads: u32,
    },
    /// Submit a batch once and print the results
    Test {
        /// File containing proxies, one per line ("-" for stdin)
        #[arg(default_value = "-")]
        input: String,
        /// Maximum concurrent checks on the tester (non-positive means default)
        #[arg(short = 'n', long, allow_hyphen_values = true)]
        threads: Option<i64>,
        /// Export successful proxies to CSV
        #[arg(short, long)]
        export: bool,
        /// Print geolocation details for each proxy that has them
        #[arg(short, long)]
        details: bool,
        /// Print the aggregated result set as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::new()
        .with_backend_url(cli.backend.clone())
        .with_export_dir(cli.export_dir.clone());

    match cli.command {
        Some(Commands::Tui { input, threads }) => {
            run_tui(&cli.log_file, config.with_default_threads(threads), input).await?
        }
        None => run_tui(&cli.log_file, config, None).await?,
        Some(Commands::Test {
            input,
            threads,
            export,
            details,
            json,
        }) => {
            match &cli.log_file {
                Some(path) => logging::init_file(path)?,
                None => logging::init_stderr(),
            }

            let raw = read_input(&input)?;
            let mut orchestrator = Orchestrator::new(config.client());

            orchestrator.submit(&raw, threads)?;
            if let SubmissionState::Failed(e) = orchestrator.wait().await {
                return Err(anyhow!(e.banner()));
            }

            let results = orchestrator.results();
            if json {
                println!("{}", serde_json::to_string_pretty(results)?);
            } else {
                print_results(results);
            }

            if details {
                print_details(results);
            }

            if export {
                match config.exporter().export(results)? {
                    ExportOutcome::Written { path, rows } => {
                        println!("Exported {} successful proxies to {:?}", rows, path)
                    }
                    ExportOutcome::NothingToExport => {
                        println!("{}", proxy_batch::proxy::export::NOTHING_TO_EXPORT)
                    }
                }
            }
        }
    }

    Ok(())
}

async fn run_tui(log_file: &Option<PathBuf>, config: Config, input: Option<PathBuf>) -> Result<()> {
    if let Some(path) = log_file {
        logging::init_file(path)?;
    }

    let mut app = BatchTesterApp::new(&config);
    if let Some(path) = input {
        app = app.with_input(std::fs::read_to_string(path)?);
    }
    app.run().await
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        Ok(raw)
    } else {
        Ok(std::fs::read_to_string(input)?)
    }
}

fn print_results(results: &ResultSet) {
    println!(
        "Results: {} total, {} success, {} error",
        results.len(),
        results.success_count,
        results.error_count
    );
    if results.unrecognized_count > 0 {
        println!("Unrecognized status: {}", results.unrecognized_count);
    }
    println!();

    for record in &results.records {
        println!(
            "{} [{}] ip={} country={} city={} time_ms={} error={}",
            record.proxy,
            record.status,
            record.ip_cell(),
            record.country_cell(),
            record.city_cell(),
            record.response_time_cell(),
            record.error_cell()
        );
        if let Some(geo_error) = &record.geo_location_error {
            println!("   geolocation: {}", geo_error);
        }
    }
}

fn print_details(results: &ResultSet) {
    let mut viewer = DetailViewer::new();
    for record in results.records.iter().filter(|r| r.has_detail()) {
        if viewer.open(record).is_err() {
            continue;
        }
        if let Some(geo) = &record.geo_location {
            println!("\n{} ({})", record.proxy, geo);
        }
        for row in viewer.rows() {
            println!("  {}: {}", row.label, row.value);
        }
        viewer.close();
    }
}
