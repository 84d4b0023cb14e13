pub mod env;
pub mod error;
pub mod serial;
pub mod shutdown;
pub mod sql;
pub mod types;

pub use self::error::{Report, Result, ResultExt};
pub use self::types::Sensitive;
