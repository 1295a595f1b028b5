use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;

use fmcontainer::cli::{run, Args};

fn prepare_tracing(json_logs: bool) {
    // Redirect all `log`'s events to our subscriber, to collect the ones from sqlx
    LogTracer::init().expect("Failed to set logger");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // `init()` would try to install a second LogTracer, so set the default directly
    let result = if json_logs {
        tracing::subscriber::set_global_default(subscriber.json().finish())
    } else {
        tracing::subscriber::set_global_default(subscriber.finish())
    };
    result.expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    prepare_tracing(args.json_logs);

    let mut stdout = std::io::stdout();
    match run(&args, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
