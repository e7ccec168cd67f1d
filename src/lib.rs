pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod fixtures;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{GitCloner, HtmlReferenceSource, HttpProbe, SimulatedStorefront};
pub use core::{CartPanel, ProductPage, RepositoryValidationPipeline, WaitPolicy};
pub use domain::model::{CountReading, DomainState, LineRef, Money, ValidationFailure};
pub use utils::error::{HarnessError, Result};
