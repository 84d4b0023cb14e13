use thiserror::Error;

#[derive(Debug, Error)]
#[error("could not load Pudding settings")]
pub struct SettingsLoadError;
