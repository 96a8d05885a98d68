use std::io;
use tracing::Level;
use tracing_appender::rolling;
use tracing_subscriber::filter::FilterFn;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const STDOUT_DIRECTIVES: &str = "info,web_request=warn,entity=warn,render=info,store=info";
const FILE_DIRECTIVES: &str = "info,web_request=debug,entity=debug,render=debug,store=debug";

pub const LOG_DIRECTORY: &str = "logs";
pub const LOG_FILE: &str = "graph-feed.log";

/// Records from the HTTP stack are only interesting when something went wrong.
fn is_transport_noise(target: &str) -> bool {
    ["hyper", "rustls", "reqwest", "h2"]
        .iter()
        .any(|noisy| target.starts_with(noisy))
}

/// Stdout honours `RUST_LOG`, the daily rolling file keeps the full request log.
pub fn configure_logging() {
    let custom_filter = FilterFn::new(|metadata| {
        !(metadata.level() > &Level::WARN && is_transport_noise(metadata.target()))
    });

    let stdout_log = fmt::layer()
        .with_writer(io::stdout)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(STDOUT_DIRECTIVES)),
        )
        .with_filter(custom_filter);

    let file_appender = rolling::daily(LOG_DIRECTORY, LOG_FILE);
    let file_log = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_filter(EnvFilter::new(FILE_DIRECTIVES));

    tracing_subscriber::Registry::default()
        .with(stdout_log)
        .with(file_log)
        .init();
}
