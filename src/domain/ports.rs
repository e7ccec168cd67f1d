use crate::domain::locator::Locator;
use crate::domain::model::RepositoryReference;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Opaque reference to an element, valid for the document state it was located in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub String);

/// A modal confirmation raised by the document. The flow stays blocked until it is accepted.
#[derive(Debug)]
pub struct Confirmation {
    message: String,
    accept: oneshot::Sender<()>,
}

impl Confirmation {
    pub fn new(message: impl Into<String>) -> (Self, oneshot::Receiver<()>) {
        let (accept, accepted) = oneshot::channel();
        (
            Self {
                message: message.into(),
                accept,
            },
            accepted,
        )
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn accept(self) -> String {
        // The document may already be gone; nothing left to unblock then.
        let _ = self.accept.send(());
        self.message
    }
}

pub type ConfirmationReceiver = mpsc::UnboundedReceiver<Confirmation>;

/// Structured state a driver may expose directly instead of through rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateQuery {
    CartItemCount,
    CatalogueProductCount,
}

/// The document-driving capability injected into every page model.
#[async_trait]
pub trait UiDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<()>;

    /// All matches in document order; empty when nothing matches.
    async fn locate(&self, locator: &Locator) -> Result<Vec<ElementHandle>>;

    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool>;

    /// Concatenated text of the element and its descendants.
    async fn read_text(&self, handle: &ElementHandle) -> Result<String>;

    /// `None` when the attribute is absent. Boolean attributes may come back as any
    /// value, including the empty string.
    async fn read_attribute(&self, handle: &ElementHandle, name: &str) -> Result<Option<String>>;

    async fn click(&self, handle: &ElementHandle) -> Result<()>;

    async fn wait_visible(&self, handle: &ElementHandle, timeout: Duration) -> Result<()>;

    /// Registers interest in confirmations raised after this call.
    async fn on_confirmation(&self) -> Result<ConfirmationReceiver>;

    /// Typed state, when the driver can read it without scraping text.
    async fn query_state(&self, _query: StateQuery) -> Result<Option<u64>> {
        Ok(None)
    }
}

/// Stage-one source of the repository link.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn fetch_reference(&self) -> Result<Option<String>>;
}

#[async_trait]
pub trait NetworkProbe: Send + Sync {
    /// Status code of a GET request to `url`.
    async fn status(&self, url: &str) -> Result<u16>;
}

#[async_trait]
pub trait RepositoryCloner: Send + Sync {
    async fn clone_into(&self, reference: &RepositoryReference, destination: &Path) -> Result<()>;
}

pub trait RepositoryCheckConfig: Send + Sync {
    fn repository_url(&self) -> Option<&str>;
    fn link_host(&self) -> &str;
    fn expected_file(&self) -> &str;
    fn clone_subpath(&self) -> &str;
    fn workspace_root(&self) -> Option<&str>;
    fn workspace_prefix(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn clone_timeout(&self) -> Duration;
}
