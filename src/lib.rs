pub mod browse;
pub mod city;
pub mod config;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod output;
pub mod source;
pub mod stats;
pub mod trips;

pub use error::{ExplorerError, Result};
