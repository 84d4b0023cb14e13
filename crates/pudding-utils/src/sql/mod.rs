use thiserror::Error;

mod util;

pub use self::util::{naive_to_dt, SqlSnowflake};

#[derive(Debug, Error)]
#[error("could not perform database query")]
pub struct QueryError;
