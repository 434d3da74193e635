use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::errors::FabricError;
use crate::models::VisualElement;

/// Identifiers and credential needed to embed one report.
#[derive(Debug, Clone)]
pub struct EmbedTarget {
    pub report_id: String,
    pub workspace_id: String,
    pub embed_url: String,
    pub embed_token: String,
}

/// The two event queues fed while a page is being watched.
///
/// `rendered` carries visual identifiers, `errors` carries report-level error messages.
pub struct RenderEvents {
    pub rendered: mpsc::UnboundedReceiver<String>,
    pub errors: mpsc::UnboundedReceiver<String>,
}

impl RenderEvents {
    /// A fresh pair of queues plus their sending halves.
    pub fn channel() -> (mpsc::UnboundedSender<String>, mpsc::UnboundedSender<String>, Self) {
        let (rendered_tx, rendered) = mpsc::unbounded_channel();
        let (errors_tx, errors) = mpsc::unbounded_channel();
        (rendered_tx, errors_tx, Self { rendered, errors })
    }
}

/// An embedded report the probe can drive page by page.
#[async_trait]
pub trait EmbedSurface: Send {
    /// Embed the report and wait for it to load. Returns the load time in milliseconds.
    async fn load_report(&mut self, target: &EmbedTarget) -> Result<f64, FabricError>;

    /// Page names in discovery order.
    async fn pages(&mut self) -> Result<Vec<String>, FabricError>;

    /// Snapshot of the visuals on a page.
    async fn visuals(&mut self, page: &str) -> Result<Vec<VisualElement>, FabricError>;

    /// Start forwarding rendered and error events into new queues.
    async fn listen(&mut self) -> Result<RenderEvents, FabricError>;

    async fn activate(&mut self, page: &str) -> Result<(), FabricError>;

    /// Stop forwarding events. Queues handed out by `listen` see no further items.
    async fn unlisten(&mut self) -> Result<(), FabricError>;

    /// PNG bytes of the embed container as currently displayed.
    async fn capture(&mut self) -> Result<Vec<u8>, FabricError>;

    async fn close(&mut self) -> Result<(), FabricError>;
}

/// Opens a fresh surface per report.
#[async_trait]
pub trait SurfaceFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn EmbedSurface>, FabricError>;
}
