mod application;
mod runtime_config;

pub use application::{Application, ApplicationError};
pub use runtime_config::{Operation, RuntimeConfig};
