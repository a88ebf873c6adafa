pub mod batch;
pub mod config;
pub mod error;
pub mod process;
pub mod schema;

pub use error::CleanError;
