pub mod binio;
pub mod cli;
pub mod compress;
pub mod config;
pub mod db;
pub mod dos_time;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod progress;
pub mod registry;
pub mod uri;
pub mod zip;

pub use error::{PackError, PackResult};
pub use lifecycle::{pack, PackOutcome};
