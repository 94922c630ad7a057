use clap::Parser;
use opinion_digest::{AppConfig, Digest, report};
use std::process::ExitCode;

mod args;
use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Pick up RAPID_API_KEY and friends from a local .env before anything reads them
    dotenv::dotenv().ok();

    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let digest = match &args.config {
        Some(path) => match Digest::from_config_file(path) {
            Ok(digest) => digest,
            Err(e) => {
                ::log::error!("Failed to load configuration: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Digest::new(AppConfig::default()),
    };
    let digest = args.apply(digest.with_env());

    if digest.config().grid.is_none() {
        println!("Note: local runs require a WebDriver server (e.g., ChromeDriver).");
        println!(
            "Set WEBDRIVER_URL environment variable if not using the default {}",
            digest.config().webdriver_url
        );
    }

    let start_time = std::time::Instant::now();
    let runs = match digest.run().await {
        Ok(runs) => runs,
        Err(e) => {
            ::log::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    for run in &runs {
        println!("{}", report::render_run(run));
    }

    let failed = runs.iter().filter(|run| run.outcome.is_err()).count();
    ::log::info!(
        "Finished {} runs ({} failed) in {:.2} seconds",
        runs.len(),
        failed,
        start_time.elapsed().as_secs_f64()
    );

    if failed == runs.len() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
