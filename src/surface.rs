//! Collaborator interfaces for the live chat surface.
//!
//! The relay core never talks to a browser directly. Everything it needs from
//! the chat client is expressed through three capabilities:
//!
//! - [`ChatSurface`]: locate the input box, sample the message tail, scroll
//!   to the newest content, release resources.
//! - [`MessageElement`]: per-message reads (text, attributes, serialized
//!   representation, geometry).
//! - [`InputHandle`]: submit one line of text into the conversation.
//!
//! Handles are re-acquired fresh every cycle. The surface re-renders at will,
//! so an element obtained in one sampling pass must never be reused in a
//! later one. Every operation may fail transiently; callers treat a
//! [`SurfaceError`] as "no data this cycle" unless the operation is a
//! startup precondition.

use async_trait::async_trait;

/// Errors from the chat surface collaborator.
///
/// All of these are transient from the relay's point of view: the element is
/// skipped or the cycle yields no events, and the next cycle re-samples from
/// scratch.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("chat surface not ready: {0}")]
    NotReady(String),

    #[error("element detached from the chat surface")]
    Detached,

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("submit failed: {0}")]
    Submit(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One message bubble in the conversation.
///
/// Attribute lookups cover the element itself, its ancestors up to a hop
/// bound, and its descendants, because chat clients attach their stable
/// message identifiers at different levels of the bubble markup.
pub trait MessageElement {
    /// Visible text of the message, before normalization.
    fn raw_text(&self) -> Result<String, SurfaceError>;

    /// Attribute on the element itself.
    fn attribute(&self, name: &str) -> Result<Option<String>, SurfaceError>;

    /// Attribute on the ancestor exactly `hops_up` levels above the element.
    /// `Ok(None)` when there is no such ancestor or it lacks the attribute.
    fn ancestor_attribute(&self, hops_up: usize, name: &str)
        -> Result<Option<String>, SurfaceError>;

    /// First attribute match among descendants, in document order.
    fn descendant_attribute(&self, name: &str) -> Result<Option<String>, SurfaceError>;

    /// Full serialized representation (structure + content), used for
    /// fingerprint identities.
    fn outer_html(&self) -> Result<String, SurfaceError>;

    /// On-screen horizontal center of the element, in viewport coordinates.
    /// `Ok(None)` when the element has no usable geometry right now.
    fn horizontal_center(&self) -> Result<Option<f64>, SurfaceError>;
}

/// The chat input box, valid for the cycle it was located in.
#[async_trait]
pub trait InputHandle {
    /// Focus the input, insert `text`, and submit it as one message.
    async fn submit(&mut self, text: &str) -> Result<(), SurfaceError>;
}

/// The live chat conversation as seen by the relay.
#[async_trait]
pub trait ChatSurface {
    type Element: MessageElement;
    type Input: InputHandle + Send;

    /// Locate the message input box. `Ok(None)` means the surface is up but
    /// no input box is visible right now.
    async fn locate_input(&mut self) -> Result<Option<Self::Input>, SurfaceError>;

    /// The last `k` messages in display order, newest last.
    async fn tail_messages(&mut self, k: usize) -> Result<Vec<Self::Element>, SurfaceError>;

    /// Current viewport width, for the direction heuristic.
    async fn viewport_width(&mut self) -> Result<Option<f64>, SurfaceError>;

    /// Ask the surface to move to the newest content so lazy loading does
    /// not withhold freshly arrived messages from the next tail sample.
    async fn scroll_to_latest(&mut self) -> Result<(), SurfaceError>;

    /// Best-effort resource release at shutdown.
    async fn release(&mut self) -> Result<(), SurfaceError>;
}
