use clap::{Parser, Subcommand};
use petstore_harness::{
    catalog, find, render_summary, run_scenario, run_timestamp, suite, write_report, Error,
    HarnessConfig, PetStoreClient, Scenario, StabilityTracker, Suite,
};
use std::{
    fs::{self, File},
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "petstore-runner", version, about = "Pet store API test harness runner")]
struct Cli {
    /// Override the configured base URL of the target API.
    #[arg(long)]
    base_url: Option<String>,

    /// Override the configured API key.
    #[arg(long)]
    api_key: Option<String>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Run every scenario.
    Full,
    /// Run the positive workflow scenarios only.
    Positive,
    /// Run the negative scenarios only.
    Negative,
    /// Run the stability analysis scenarios only.
    Stability,
    /// Run one scenario by name.
    Single { name: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(all_passed) => {
            if all_passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(error) => {
            eprintln!("runner error: {}", error);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<bool, Error> {
    let mut config = HarnessConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url.trim_end_matches('/').to_string();
    }
    if let Some(api_key) = cli.api_key {
        config.api_key = api_key;
    }

    let timestamp = run_timestamp();
    let log_path = init_logging(&config, &timestamp)?;

    let scenarios = select_scenarios(&cli.mode)?;
    tracing::info!(
        "run {} started: {} scenario(s) against {}",
        timestamp,
        scenarios.len(),
        config.base_url
    );

    let client = PetStoreClient::from_config(&config)?;
    let mut tracker = StabilityTracker::new();

    let mut results = Vec::with_capacity(scenarios.len());
    for scenario in &scenarios {
        let result = run_scenario(scenario, &client, &mut tracker);
        let marker = if result.passed { "PASS" } else { "FAIL" };
        println!("[{}] {}", marker, result.name);
        if let Some(detail) = &result.detail {
            println!("       {}", detail);
        }
        results.push(result);
    }

    let summary = tracker.summarize();
    let rendered = render_summary(&results, &summary);
    let report_path = write_report(&config.reports_dir, &timestamp, &rendered)?;

    println!();
    print!("{}", rendered);
    println!();
    println!("log:    {}", log_path.display());
    println!("report: {}", report_path.display());

    let all_passed = results.iter().all(|result| result.passed);
    tracing::info!(
        "run {} finished: {}",
        timestamp,
        if all_passed { "all passed" } else { "failures" }
    );
    Ok(all_passed)
}

fn select_scenarios(mode: &Mode) -> Result<Vec<Scenario>, Error> {
    match mode {
        Mode::Full => Ok(catalog()),
        Mode::Positive => Ok(suite(Suite::Positive)),
        Mode::Negative => Ok(suite(Suite::Negative)),
        Mode::Stability => Ok(suite(Suite::Stability)),
        Mode::Single { name } => {
            let scenario = find(name).ok_or_else(|| {
                let known: Vec<_> = catalog().iter().map(|scenario| scenario.name).collect();
                Error::validation(format!(
                    "unknown scenario {:?}, known scenarios: {}",
                    name,
                    known.join(", ")
                ))
            })?;
            Ok(vec![scenario])
        }
    }
}

/// Route tracing output into the per-run log file. Console output stays
/// plain println so the summary reads cleanly.
fn init_logging(config: &HarnessConfig, timestamp: &str) -> Result<PathBuf, Error> {
    fs::create_dir_all(&config.logs_dir)?;
    let log_path = config.logs_dir.join(format!("test_run_{}.log", timestamp));
    let log_file = Arc::new(File::create(&log_path)?);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(log_file)
        .init();

    Ok(log_path)
}
