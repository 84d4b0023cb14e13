mod impls;
mod migrator;

pub use self::migrator::*;

pub mod forms;
pub mod types;

#[allow(clippy::unwrap_used, clippy::unreadable_literal)]
#[cfg(test)]
pub(crate) mod test_utils;
