pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod media;
pub mod viz;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
