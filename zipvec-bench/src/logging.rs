//! Sets up logging for the harness using `tracing_subscriber`, either as
//! JSON or in a pretty format.
//!
//! Events go to stderr so that tables and JSON results on stdout stay
//! clean.

use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Sets up logging based on the provided format preference.
///
/// `RUST_LOG` overrides `directives` when it is set.
pub fn setup_logging(directives: &str, pretty: bool) {
    match pretty {
        true => setup_logging_pretty(directives),
        false => setup_logging_json(directives),
    }
}

fn env_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
}

fn setup_logging_json(directives: &str) {
    let main_layer = tracing_subscriber::fmt::layer()
        .json()
        .flatten_event(true)
        .with_target(false)
        .with_current_span(true)
        .with_span_list(true)
        .with_line_number(true)
        .with_file(true)
        .with_writer(std::io::stderr)
        .with_timer(UtcTime::rfc_3339());

    tracing_subscriber::registry()
        .with(env_filter(directives))
        .with(main_layer)
        .init()
}

fn setup_logging_pretty(directives: &str) {
    let main_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr)
        .with_timer(UtcTime::rfc_3339());

    tracing_subscriber::registry()
        .with(env_filter(directives))
        .with(main_layer)
        .init()
}
