//! In-process simulated chat surface.
//!
//! A browser-backed surface is deliberately out of scope here; this module
//! stands in for it so the whole relay path is runnable and testable without
//! a browser. The simulation renders messages the way a web chat client
//! would: operator messages sit on the right half of a virtual viewport,
//! replies on the left, every bubble carries a durable `data-message-id`,
//! and the raw text is decorated with a private-use glyph and a trailing
//! clock timestamp so the normalizer has real work to do.
//!
//! In echo mode (the demo binary) every submitted line is answered with a
//! canned reply. Tests use the quiet mode plus [`SimSurface::push_incoming`]
//! and [`SimSurface::edit_message`] to script the conversation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::surface::{ChatSurface, InputHandle, MessageElement, SurfaceError};

const VIEWPORT_WIDTH: f64 = 1280.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone)]
struct SimMessage {
    id: String,
    side: Side,
    body: String,
    /// Fake wall clock rendered into the bubble, "H:MM".
    clock: String,
    /// Bumped on edit so the serialized representation changes too.
    revision: u32,
}

#[derive(Default)]
struct SimState {
    messages: Vec<SimMessage>,
    submitted: Vec<String>,
}

/// Shared simulated conversation. Cloning yields another handle onto the
/// same conversation, which is how tests script it while the relay polls it.
#[derive(Clone)]
pub struct SimSurface {
    state: Arc<Mutex<SimState>>,
    next_id: Arc<AtomicU64>,
    input_available: Arc<AtomicBool>,
    echo: bool,
}

impl SimSurface {
    /// Quiet surface: submitted lines appear in the conversation but nothing
    /// answers them.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::default())),
            next_id: Arc::new(AtomicU64::new(1)),
            input_available: Arc::new(AtomicBool::new(true)),
            echo: false,
        }
    }

    /// Surface that answers every submitted line with a canned reply.
    pub fn echoing() -> Self {
        Self {
            echo: true,
            ..Self::new()
        }
    }

    /// Append a reply-side message; returns its durable id.
    pub fn push_incoming(&self, body: &str) -> String {
        self.push(Side::Left, body)
    }

    /// Append an operator-side message; returns its durable id.
    pub fn push_outgoing(&self, body: &str) -> String {
        self.push(Side::Right, body)
    }

    /// Replace the body of an existing message, as an in-place edit.
    pub fn edit_message(&self, id: &str, body: &str) {
        let mut state = self.state.lock().expect("sim state poisoned");
        if let Some(message) = state.messages.iter_mut().find(|m| m.id == id) {
            message.body = body.to_string();
            message.revision += 1;
        }
    }

    /// Lines that reached the input box, in submission order.
    pub fn submitted(&self) -> Vec<String> {
        self.state
            .lock()
            .expect("sim state poisoned")
            .submitted
            .clone()
    }

    /// Toggle whether the input box can be located, to exercise send-failure
    /// paths.
    pub fn set_input_available(&self, available: bool) {
        self.input_available.store(available, Ordering::SeqCst);
    }

    pub fn message_count(&self) -> usize {
        self.state.lock().expect("sim state poisoned").messages.len()
    }

    fn push(&self, side: Side, body: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = format!("sim-{n}");
        let clock = format!("12:{:02}", n % 60);
        let message = SimMessage {
            id: id.clone(),
            side,
            body: body.to_string(),
            clock,
            revision: 0,
        };
        self.state
            .lock()
            .expect("sim state poisoned")
            .messages
            .push(message);
        id
    }
}

impl Default for SimSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatSurface for SimSurface {
    type Element = SimElement;
    type Input = SimInput;

    async fn locate_input(&mut self) -> Result<Option<Self::Input>, SurfaceError> {
        if !self.input_available.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(SimInput {
            surface: self.clone(),
        }))
    }

    async fn tail_messages(&mut self, k: usize) -> Result<Vec<Self::Element>, SurfaceError> {
        let state = self.state.lock().expect("sim state poisoned");
        let skip = state.messages.len().saturating_sub(k);
        Ok(state
            .messages
            .iter()
            .skip(skip)
            .cloned()
            .map(|message| SimElement { message })
            .collect())
    }

    async fn viewport_width(&mut self) -> Result<Option<f64>, SurfaceError> {
        Ok(Some(VIEWPORT_WIDTH))
    }

    async fn scroll_to_latest(&mut self) -> Result<(), SurfaceError> {
        // Nothing lazy-loads in the simulation.
        Ok(())
    }

    async fn release(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }
}

/// Snapshot of one simulated bubble, valid for the sampling pass it came
/// from.
pub struct SimElement {
    message: SimMessage,
}

impl MessageElement for SimElement {
    fn raw_text(&self) -> Result<String, SurfaceError> {
        // Body, then a status line with an icon glyph and the clock, the way
        // a web client decorates a bubble.
        Ok(format!(
            "{}\n\u{E00A} {}",
            self.message.body, self.message.clock
        ))
    }

    fn attribute(&self, name: &str) -> Result<Option<String>, SurfaceError> {
        match name {
            "data-message-id" => Ok(Some(self.message.id.clone())),
            _ => Ok(None),
        }
    }

    fn ancestor_attribute(
        &self,
        _hops_up: usize,
        _name: &str,
    ) -> Result<Option<String>, SurfaceError> {
        Ok(None)
    }

    fn descendant_attribute(&self, _name: &str) -> Result<Option<String>, SurfaceError> {
        Ok(None)
    }

    fn outer_html(&self) -> Result<String, SurfaceError> {
        let class = match self.message.side {
            Side::Left => "bubble in",
            Side::Right => "bubble out",
        };
        Ok(format!(
            "<div class=\"{}\" data-message-id=\"{}\" data-rev=\"{}\"><p>{}</p><span class=\"meta\">{}</span></div>",
            class, self.message.id, self.message.revision, self.message.body, self.message.clock
        ))
    }

    fn horizontal_center(&self) -> Result<Option<f64>, SurfaceError> {
        Ok(Some(match self.message.side {
            Side::Left => VIEWPORT_WIDTH * 0.25,
            Side::Right => VIEWPORT_WIDTH * 0.75,
        }))
    }
}

/// Input box of the simulated conversation.
pub struct SimInput {
    surface: SimSurface,
}

#[async_trait]
impl InputHandle for SimInput {
    async fn submit(&mut self, text: &str) -> Result<(), SurfaceError> {
        if !self.surface.input_available.load(Ordering::SeqCst) {
            return Err(SurfaceError::Detached);
        }

        self.surface
            .state
            .lock()
            .expect("sim state poisoned")
            .submitted
            .push(text.to_string());
        self.surface.push_outgoing(text);

        if self.surface.echo {
            self.surface.push_incoming(&format!("echo: {text}"));
        }

        Ok(())
    }
}
