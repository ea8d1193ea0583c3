use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Env var consulted before `RUST_LOG`.
const LOG_ENV: &str = "BOOTSTRAP_LOG";

/// Bootstrap messages at `info` (or `debug` when verbose); dependencies such
/// as the HTTP and AWS clients only surface warnings.
const fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "warn,locust_bootstrap=debug"
    } else {
        "warn,locust_bootstrap=info"
    }
}

/// Parses the user supplied directives, falling back to the defaults when
/// they are absent or malformed.
fn build_filter(directives: Option<&str>, verbose: bool) -> EnvFilter {
    directives
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directives(verbose)))
}

/// Installs the global subscriber. `BOOTSTRAP_LOG` wins over `RUST_LOG`.
pub fn init_logging(verbose: bool, no_color: bool) {
    let directives = std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(build_filter(directives.as_deref(), verbose))
        .with_ansi(!no_color)
        .with_target(verbose)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}
