use std::error::Error as _;
use std::process::ExitCode;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use update_batching::{run_all, BenchConfig};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = BenchConfig::default();
    let mut rng = StdRng::from_entropy();
    let stdout = std::io::stdout();

    match run_all(&config, &mut rng, &mut stdout.lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            let mut message = err.to_string();
            let mut source = err.source();
            while let Some(cause) = source {
                message.push_str(": ");
                message.push_str(&cause.to_string());
                source = cause.source();
            }
            error!("benchmark aborted: {message}");
            ExitCode::FAILURE
        }
    }
}
