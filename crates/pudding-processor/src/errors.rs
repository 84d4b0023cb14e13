use thiserror::Error;

#[derive(Debug, Error)]
#[error("could not decode event payload")]
pub struct DecodeError;

#[derive(Debug, Error)]
#[error("could not declare queue bindings")]
pub struct BindingError;

#[derive(Debug, Error)]
#[error("broker channel failed")]
pub struct BrokerError;

#[derive(Debug, Error)]
#[error("could not process event")]
pub struct ProcessError;
