// Adapters layer: concrete implementations of the domain ports (http, git, in-memory storefront).

pub mod git;
pub mod http;
pub mod simulated;

pub use git::GitCloner;
pub use http::{HtmlReferenceSource, HttpProbe};
pub use simulated::SimulatedStorefront;
