//! Tracing subscriber bootstrap and metric descriptions.
//!
//! Only the `metrics` facade is used; whichever recorder the embedding
//! process installs receives the descriptions below.

use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing::debug;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::cache::metric_names;
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

enum Kind {
    Counter,
    Histogram,
}

const METRICS: &[(&str, Kind, &str)] = &[
    (
        metric_names::RESPONSE_HIT,
        Kind::Counter,
        "Requests answered from the response cache.",
    ),
    (
        metric_names::RESPONSE_MISS,
        Kind::Counter,
        "Requests that missed the response cache.",
    ),
    (
        metric_names::POPULATION_RUNS,
        Kind::Counter,
        "Finished snapshot population runs, labelled by outcome.",
    ),
    (
        metric_names::SEARCH_FALLBACK,
        Kind::Counter,
        "Search requests forwarded upstream because the snapshot was not ready.",
    ),
    (
        metric_names::POPULATION_MS,
        Kind::Histogram,
        "Time from population start to a committed snapshot.",
    ),
];

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install the global subscriber. Fails if one is already installed.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(output_layer(logging.format))
        .try_init()
        .map_err(|err| InfraError::telemetry(format!("subscriber already installed: {err}")))?;

    debug!(
        target = "postcache::telemetry",
        level = %logging.level,
        json = matches!(logging.format, LogFormat::Json),
        "Logging initialised"
    );
    Ok(())
}

fn output_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    }
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        for (name, kind, help) in METRICS {
            match kind {
                Kind::Counter => describe_counter!(*name, Unit::Count, *help),
                Kind::Histogram => describe_histogram!(*name, Unit::Milliseconds, *help),
            }
        }
    });
}
