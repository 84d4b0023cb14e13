use doku::Document;
use serde::Deserialize;

#[derive(Debug, Default, Document, Deserialize)]
#[serde(default)]
pub struct Logging {
    /// Rendering style for log output.
    ///
    /// There are three styles to choose from:
    /// - `compact` - compacts logs but it is readable enough
    /// - `pretty` - makes the entire logs pretty
    /// - `json` - serializes logs into JSON data
    ///
    /// The default value is `compact`, if not set.
    #[doku(as = "String", example = "compact")]
    pub style: LoggingStyle,

    /// Filters spans and events based on a set of directives.
    ///
    /// You may refer on how directives work and parse by going to:
    /// https://docs.rs/tracing-subscriber/0.3.18/tracing_subscriber/filter/struct.EnvFilter.html
    ///
    /// This value may be overridden with the `RUST_LOG` environment
    /// variable. The default value filters events and spans with the
    /// `info` level only.
    #[doku(example = "info")]
    pub targets: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingStyle {
    #[default]
    Compact,
    Pretty,
    JSON,
}
