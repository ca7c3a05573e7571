mod builtins;
mod error;
mod executor;
mod redirect;

pub use error::ExecError;
pub use executor::{Engine, Outcome};
