pub mod cart;
pub mod catalogue;
pub mod reader;
pub mod repository;
pub mod wait;
pub mod workspace;

pub use crate::utils::error::Result;
pub use cart::{CartPanel, CartSelectors};
pub use catalogue::{CatalogueSelectors, ProductPage};
pub use repository::{
    PageReferenceSource, RepositoryCheckSettings, RepositoryValidationPipeline, StaticReference,
};
pub use wait::WaitPolicy;
pub use workspace::{Workspace, WorkspaceState};
