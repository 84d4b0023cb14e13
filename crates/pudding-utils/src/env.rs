use std::error::Error as StdError;
use std::str::FromStr;
use thiserror::Error;

use crate::error::ResultExt;
use crate::Result;

#[derive(Debug, Error)]
#[error("could not load environment variable")]
pub struct LoadEnvError;

pub fn var(key: &'static str) -> Result<String, LoadEnvError> {
    dotenvy::var(key)
        .change_context(LoadEnvError)
        .attach_printable_lazy(|| format!("from variable: {key}"))
}

pub fn var_opt(key: &'static str) -> Result<Option<String>, LoadEnvError> {
    use std::env::VarError;
    match dotenvy::var(key) {
        Ok(n) => Ok(Some(n)),
        Err(dotenvy::Error::EnvVar(VarError::NotPresent)) => Ok(None),
        Err(other) => Err(other)
            .change_context(LoadEnvError)
            .attach_printable_lazy(|| format!("from variable: {key}")),
    }
}

pub fn var_opt_parsed<T: FromStr>(key: &'static str) -> Result<Option<T>, LoadEnvError>
where
    T::Err: StdError + Send + Sync + 'static,
{
    let Some(value) = var_opt(key)? else {
        return Ok(None);
    };
    value
        .parse::<T>()
        .map(Some)
        .change_context(LoadEnvError)
        .attach_printable_lazy(|| format!("could not parse value of {key:?} variable"))
}
