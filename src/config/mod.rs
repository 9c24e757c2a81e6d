#[allow(clippy::module_inception)]
mod config;
pub mod global;

pub use config::{ErrorMode, FileboostConfig};
