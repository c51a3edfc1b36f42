pub mod config;
pub mod error;
pub mod model;
pub mod outcome;
pub mod query;
pub mod time;

pub use error::{PulseError, Result};
