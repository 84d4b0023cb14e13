use config::{Config, ConfigBuilder};
use doku::Document;
use pudding_utils::env::var_opt;
use pudding_utils::error::tags::Suggestion;
use pudding_utils::error::ResultExt;
use pudding_utils::Result as PuddingResult;
use serde::Deserialize;
use std::path::{Path, PathBuf};

mod broker;
mod database;
mod error;
mod logging;

pub use self::broker::*;
pub use self::database::*;
pub use self::error::SettingsLoadError;
pub use self::logging::*;

#[derive(Debug, Document, Deserialize)]
pub struct Settings {
    broker: Broker,
    database: Database,

    #[serde(default)]
    logging: Logging,
    #[serde(skip)]
    #[doku(skip)]
    path: Option<PathBuf>,

    /// How many CPU threads the processor will utilize.
    ///
    /// Each event module consumes its queue sequentially, so the
    /// processor rarely benefits from more than a couple of threads.
    ///
    /// The default if not set is the total amount of physical CPU
    /// cores divided by 2 (spare for the operating system). If the
    /// CPU is a single core, it will utilize one core only.
    #[doku(example = "2")]
    #[serde(default = "Settings::default_threads")]
    threads: usize,
}

impl Settings {
    pub fn from_env() -> PuddingResult<Self, SettingsLoadError> {
        let mut builder = Config::builder().add_source(
            config::Environment::with_prefix("PUDDING")
                .prefix_separator("_")
                .separator("_")
                .convert_case(config::Case::Snake),
        );

        let resolved_path = Self::resolve_path()?;
        if let Some(resolved_path) = resolved_path.as_ref() {
            // this is to enforce users to use TOML instead
            let source: config::File<config::FileSourceFile, config::FileFormat> =
                resolved_path.clone().into();

            builder = builder.add_source(source.format(config::FileFormat::Toml));
        }

        let builder = Self::resolve_alternative_vars(builder)?;
        let config = builder.build().change_context(SettingsLoadError)?;

        let mut settings: Settings = config
            .try_deserialize()
            .change_context(SettingsLoadError)
            .attach_printable_lazy(|| format!("loaded settings file from: {resolved_path:?}"))?;

        settings.path = resolved_path;
        Ok(settings)
    }

    const ALTERNATIVE_FILE_PATHS: &'static [&'static str] = &[
        "pudding.toml",
        #[cfg(windows)]
        "%USERPROFILE%/.pudding/settings.toml",
        // these are only applicable in Unix systems
        #[cfg(target_family = "unix")]
        "/etc/pudding/settings.toml",
    ];

    pub fn resolve_path() -> PuddingResult<Option<PathBuf>, SettingsLoadError> {
        // PUDDING_SETTINGS
        let mut resolved_path = pudding_utils::env::var_opt_parsed::<PathBuf>("PUDDING_SETTINGS")
            .change_context(SettingsLoadError)
            .attach(Suggestion::new("`PUDDING_SETTINGS` must be a valid path"))?;

        // Try to load from alternative paths
        for path in Self::ALTERNATIVE_FILE_PATHS {
            let file_exists = std::fs::metadata(path)
                .map(|v| v.is_file())
                .unwrap_or(false);

            if file_exists {
                resolved_path = Some(resolved_path.unwrap_or_else(|| PathBuf::from(path)));
                break;
            }
        }

        Ok(resolved_path)
    }

    /// Generates TOML data with default values of [`Settings`] and
    /// documentation using [`doku`].
    #[must_use]
    pub fn generate_docs() -> String {
        let fmt = doku::toml::Formatting {
            ..Default::default()
        };
        doku::to_toml_fmt::<Self>(&fmt)
    }
}

impl Settings {
    #[must_use]
    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    #[must_use]
    pub fn database(&self) -> &Database {
        &self.database
    }

    #[must_use]
    pub fn logging(&self) -> &Logging {
        &self.logging
    }

    #[must_use]
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Current working path for the [`Settings`] file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Settings {
    fn default_threads() -> usize {
        (num_cpus::get_physical() / 2).max(1)
    }

    fn resolve_alternative_vars(
        mut builder: ConfigBuilder<config::builder::DefaultState>,
    ) -> PuddingResult<ConfigBuilder<config::builder::DefaultState>, SettingsLoadError> {
        // `DATABASE_URL` is commonly set for sqlx tooling; reuse it
        // when the settings do not provide their own URL.
        if let Some(value) = var_opt("DATABASE_URL").change_context(SettingsLoadError)? {
            builder = builder
                .set_default("database.url", value)
                .change_context(SettingsLoadError)
                .attach_printable("could not override settings for DATABASE_URL")?;
        }

        // Some people configure their broker address with `AMQP_URL`
        // or `AMQP_ADDR` instead.
        let alt_broker = match var_opt("AMQP_URL").change_context(SettingsLoadError)? {
            Some(value) => Some(value),
            None => var_opt("AMQP_ADDR").change_context(SettingsLoadError)?,
        };

        if let Some(value) = alt_broker {
            builder = builder
                .set_default("broker.url", value)
                .change_context(SettingsLoadError)
                .attach_printable("could not override settings for broker url")?;
        }

        // `RUST_LOG` usage
        if let Some(value) = var_opt("RUST_LOG").change_context(SettingsLoadError)? {
            builder = builder
                .set_override("logging.targets", value)
                .change_context(SettingsLoadError)
                .attach_printable("could not override settings for RUST_LOG")?;
        }

        Ok(builder)
    }
}
