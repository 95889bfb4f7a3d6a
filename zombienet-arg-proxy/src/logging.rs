use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Used when `RUST_LOG` is unset, keeping the proxy quiet next to the collator's own output.
pub const DEFAULT_FILTER: &str = "warn";

/// Builds the filter from [`DEFAULT_FILTER`] plus every valid directive in `rust_log`.
pub fn env_filter(rust_log: Option<&str>) -> EnvFilter {
    let mut env_filter = EnvFilter::new(DEFAULT_FILTER);
    let Some(rust_log) = rust_log else {
        return env_filter;
    };

    for directive in rust_log.split(',').filter(|s| !s.is_empty()) {
        match directive.parse() {
            Ok(directive) => env_filter = env_filter.add_directive(directive),
            Err(err) => eprintln!("Ignoring directive `{}`: {}", directive, err),
        }
    }
    env_filter
}

/// Installs the global subscriber. Logs go to stderr, stdout belongs to the child.
pub fn init() {
    let rust_log = std::env::var("RUST_LOG").ok();
    let _ = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter(rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();
}
