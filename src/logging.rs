use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "urlscan_search=info";
const VERBOSE_FILTER: &str = "urlscan_search=debug";

/// Pick the filter directive: `RUST_LOG` wins, then the verbose switch.
pub fn filter_directive(env: Option<&str>, verbose: bool) -> String {
    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directive) => directive.to_string(),
        None if verbose => VERBOSE_FILTER.to_string(),
        None => DEFAULT_FILTER.to_string(),
    }
}

/// Install the fmt subscriber on stderr so stdout keeps only the
/// user-facing messages.
pub fn init_tracing(verbose: bool) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(env.as_deref(), verbose);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false)
        .try_init();
}
