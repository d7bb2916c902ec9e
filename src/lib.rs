pub mod browser;
pub mod catalog;
pub mod configuration;
pub mod error;
pub mod fetch;
pub mod identifiers;
pub mod layout;
pub mod models;
pub mod pages;
pub mod politeness;
pub mod run;
pub mod selection;

#[cfg(test)]
mod testing;

pub use configuration::Settings;
pub use error::{CrawlError, Result};
pub use models::Cli;
pub use run::{crawl, run, RunOptions, RunSummary};
