mod consumer;
mod errors;

pub mod broker;
pub mod envelope;
pub mod modules;

pub use self::consumer::Consumer;
pub use self::errors::{BindingError, BrokerError, DecodeError, ProcessError};
