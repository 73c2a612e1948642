use std::process::ExitCode;

use tracing::error;

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match cli::run() {
        cli::RunOutcome::Serve(config) => config,
        cli::RunOutcome::Exit(code) => return ExitCode::from(code),
    };

    if let Err(err) = mailpush::logging::init(config.log_target, &config.log_level) {
        eprintln!("error: {err}");
        return ExitCode::from(2);
    }

    match mailpush::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
