//! The change-detection loop.
//!
//! [`ChatRelay`] owns all interaction with the chat surface. Each cycle it
//! first drains the operator's outgoing queue and submits those lines, then
//! samples the tail window of the conversation and classifies every message
//! against the seen-set as new, unchanged, or edited. New and edited
//! messages become [`RelayEvent`]s printed on the operator console.
//!
//! The first cycle is special: the messages already on screen are registered
//! silently so the operator is not replayed pre-existing history.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::identity::{self, MessageIdentity};
use crate::normalize::normalize;
use crate::seen::SeenSet;
use crate::surface::{ChatSurface, InputHandle, MessageElement, SurfaceError};

/// Fatal startup failures. Anything after a successful baseline is handled
/// in-cycle and never surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("chat input box not found; is the conversation open?")]
    InputNotFound,

    #[error("no messages visible at startup; is the conversation loaded?")]
    NoMessages,

    #[error("chat surface failure at startup: {0}")]
    Surface(#[from] SurfaceError),
}

/// Which side of the conversation a message came from. Informational only;
/// never part of identity or dedup decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Incoming,
    Outgoing,
    Unknown,
}

impl Direction {
    /// Console prefix for this direction.
    pub fn prefix(&self) -> &'static str {
        match self {
            Direction::Incoming => "[in ] ",
            Direction::Outgoing => "[you] ",
            Direction::Unknown => "[msg] ",
        }
    }
}

/// What the classifier decided about a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    New,
    Edited,
}

/// One line of operator-facing output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayEvent {
    pub direction: Direction,
    pub kind: EventKind,
    pub text: String,
}

impl std::fmt::Display for RelayEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            EventKind::New => write!(f, "{}{}", self.direction.prefix(), self.text),
            EventKind::Edited => write!(f, "{}[edit] {}", self.direction.prefix(), self.text),
        }
    }
}

/// Result of one detection cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Events to print, possibly none.
    Continue(Vec<RelayEvent>),
    /// The operator asked to stop.
    Shutdown,
}

/// The relay engine: single owner of the chat surface.
pub struct ChatRelay<S: ChatSurface> {
    surface: S,
    config: RelayConfig,
    seen: SeenSet,
    outgoing: mpsc::UnboundedReceiver<String>,
}

impl<S: ChatSurface> ChatRelay<S> {
    pub fn new(surface: S, config: RelayConfig, outgoing: mpsc::UnboundedReceiver<String>) -> Self {
        let seen = SeenSet::new(config.detection.seen_capacity);
        Self {
            surface,
            config,
            seen,
            outgoing,
        }
    }

    /// Register everything currently in the tail window without emitting.
    ///
    /// Startup preconditions are checked here: a locatable input box and a
    /// non-empty tail. Returns the number of messages registered.
    pub async fn baseline(&mut self) -> Result<usize, RelayError> {
        if self.surface.locate_input().await?.is_none() {
            return Err(RelayError::InputNotFound);
        }

        let tail = self
            .surface
            .tail_messages(self.config.detection.tail_window)
            .await?;
        if tail.is_empty() {
            return Err(RelayError::NoMessages);
        }

        for element in &tail {
            if let Some((identity, text)) = self.read_element(element) {
                self.seen.remember(identity, text);
            }
        }

        Ok(self.seen.len())
    }

    /// Run one cycle: drain and send operator lines, then detect changes,
    /// then nudge the surface to its newest content.
    pub async fn tick(&mut self) -> CycleOutcome {
        if self.drain_outgoing().await {
            return CycleOutcome::Shutdown;
        }

        let events = self.detect_changes().await;

        if let Err(e) = self.surface.scroll_to_latest().await {
            debug!("scroll to latest failed: {e}");
        }

        CycleOutcome::Continue(events)
    }

    /// Run cycles at the configured interval until the operator exits or the
    /// shutdown flag is raised. Releases the surface on the way out.
    pub async fn run(&mut self, shutdown: Arc<AtomicBool>) -> Result<(), RelayError> {
        let registered = self.baseline().await?;
        info!("baseline established, {registered} messages registered");

        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.config.timing.poll_interval_ms));

        loop {
            ticker.tick().await;

            if shutdown.load(Ordering::SeqCst) {
                info!("interrupt received, shutting down");
                break;
            }

            match self.tick().await {
                CycleOutcome::Shutdown => {
                    info!("exit requested by operator");
                    break;
                }
                CycleOutcome::Continue(events) => {
                    for event in events {
                        println!("{event}");
                    }
                }
            }
        }

        // Teardown must not crash after a clean session.
        if let Err(e) = self.surface.release().await {
            debug!("surface release failed: {e}");
        }

        Ok(())
    }

    /// Drain the outgoing queue in arrival order. Returns `true` when the
    /// exit sentinel was drained; the sentinel itself is never submitted.
    async fn drain_outgoing(&mut self) -> bool {
        loop {
            match self.outgoing.try_recv() {
                Ok(line) => {
                    if line == self.config.console.exit_sentinel {
                        return true;
                    }
                    self.send_line(&line).await;
                }
                Err(TryRecvError::Empty) => return false,
                // Input collection ended (stdin EOF). Incoming relay keeps
                // running; only the sentinel or an interrupt stops the loop.
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    /// Submit one operator line. The input handle is located fresh for every
    /// send; a line that cannot be submitted is dropped, not retried.
    async fn send_line(&mut self, line: &str) {
        let mut input = match self.surface.locate_input().await {
            Ok(Some(input)) => input,
            Ok(None) => {
                warn!("input box not found, dropping outgoing line");
                return;
            }
            Err(e) => {
                warn!("input box lookup failed ({e}), dropping outgoing line");
                return;
            }
        };

        if let Err(e) = input.submit(line).await {
            warn!("submit failed ({e}), outgoing line dropped");
        }
    }

    /// Sample the tail window and classify each message against the seen-set.
    async fn detect_changes(&mut self) -> Vec<RelayEvent> {
        let tail = match self
            .surface
            .tail_messages(self.config.detection.tail_window)
            .await
        {
            Ok(tail) => tail,
            Err(e) => {
                debug!("tail sample failed, no events this cycle: {e}");
                return Vec::new();
            }
        };

        let midpoint = match self.surface.viewport_width().await {
            Ok(Some(width)) if width > 0.0 => Some(width / 2.0),
            _ => None,
        };

        let mut events = Vec::new();
        for element in &tail {
            let Some((identity, text)) = self.read_element(element) else {
                continue;
            };

            let direction = classify_direction(element, midpoint);

            match self.seen.lookup(&identity) {
                None => {
                    self.seen.remember(identity, text.clone());
                    events.push(RelayEvent {
                        direction,
                        kind: EventKind::New,
                        text,
                    });
                }
                Some(previous) if previous != text => {
                    self.seen.remember(identity, text.clone());
                    events.push(RelayEvent {
                        direction,
                        kind: EventKind::Edited,
                        text,
                    });
                }
                Some(_) => {}
            }
        }

        events
    }

    /// Resolve identity and normalized text for one element. `None` means
    /// the element gave no usable data this cycle (transient failure or a
    /// rendering artifact with no text); it will be re-attempted next cycle.
    fn read_element(&self, element: &S::Element) -> Option<(MessageIdentity, String)> {
        let identity = match identity::resolve(element) {
            Ok(identity) => identity,
            Err(e) => {
                debug!("identity resolution failed, skipping element: {e}");
                return None;
            }
        };

        let raw = match element.raw_text() {
            Ok(raw) => raw,
            Err(e) => {
                debug!("text extraction failed, skipping element: {e}");
                return None;
            }
        };

        let text = normalize(&raw);
        if text.is_empty() {
            return None;
        }

        Some((identity, text))
    }

    /// Number of identities currently remembered.
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

/// Outgoing if the element's center sits right of the viewport midpoint,
/// incoming if left. A heuristic: when geometry is unavailable the message
/// is reported with the neutral prefix rather than skipped.
fn classify_direction<E: MessageElement>(element: &E, midpoint: Option<f64>) -> Direction {
    let Some(midpoint) = midpoint else {
        return Direction::Unknown;
    };
    match element.horizontal_center() {
        Ok(Some(center)) if center > midpoint => Direction::Outgoing,
        Ok(Some(_)) => Direction::Incoming,
        _ => Direction::Unknown,
    }
}
