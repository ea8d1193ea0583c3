use std::process::ExitCode;

fn main() -> ExitCode {
    match locust_bootstrap::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{}", err);
            ExitCode::from(err.exit_code())
        }
    }
}
