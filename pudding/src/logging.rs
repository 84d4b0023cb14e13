use pudding_settings::{Logging, LoggingStyle};
use pudding_utils::error::tags::Suggestion;
use pudding_utils::error::ResultExt;
use pudding_utils::Result;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_error::ErrorLayer;
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[derive(Debug, Error)]
#[error("could not initialize logging")]
pub struct LoggingInitError;

const DIRECTIVES_SUGGESTION: &str = "Read the syntax guide for filter directives at:\nhttps://docs.rs/tracing-subscriber/0.3.18/tracing_subscriber/filter/struct.EnvFilter.html#directives";

pub fn init(settings: &Logging) -> Result<(), LoggingInitError> {
    // events emitted through the `log` facade (sqlx and lapin both
    // use it) get forwarded into tracing
    tracing_log::LogTracer::init()
        .change_context(LoggingInitError)
        .attach_printable("could not initialize log tracer")?;

    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse(&settings.targets)
        .change_context(LoggingInitError)
        .attach_printable("could not parse log targets")
        .attach(Suggestion::new(DIRECTIVES_SUGGESTION))?;

    let log_layer = match settings.style {
        LoggingStyle::Compact => tracing_subscriber::fmt::layer().compact().boxed(),
        LoggingStyle::Pretty => tracing_subscriber::fmt::layer().pretty().boxed(),
        LoggingStyle::JSON => tracing_subscriber::fmt::layer().json().boxed(),
    }
    .with_filter(env_filter);

    let subscriber = tracing_subscriber::Registry::default()
        .with(log_layer)
        .with(ErrorLayer::default());

    tracing::subscriber::set_global_default(subscriber)
        .change_context(LoggingInitError)
        .attach_printable("unable to setup tracing")?;

    Ok(())
}
