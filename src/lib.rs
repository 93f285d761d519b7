//! chat-relay - console bridge to a live browser chat.
//!
//! This crate relays operator-typed lines into a chat conversation and
//! relays new or edited conversation messages back to the operator's
//! console, continuously. The heart of it is the change-detection engine:
//!
//! - **normalize**: canonicalizes extracted message text so identical
//!   logical content compares equal despite rendering noise.
//! - **identity**: assigns each message a stable identity, preferring a
//!   durable document-exposed identifier over a content fingerprint.
//! - **seen**: a bounded, insertion-order-evicting cache of identity →
//!   last-known text, keeping memory flat over an indefinite run.
//! - **relay**: the detection loop that samples the message tail every
//!   cycle, classifies new / unchanged / edited, and drains the operator's
//!   outgoing queue.
//!
//! # Architecture
//!
//! Exactly two tasks run: a blocking stdin reader that enqueues operator
//! lines, and the relay loop, which is the only task allowed to touch the
//! chat surface. They share nothing but an unbounded FIFO channel. The chat
//! surface itself is a trait ([`surface::ChatSurface`]); the shipped
//! implementation is an in-process simulation ([`sim::SimSurface`]), since
//! browser transport is outside this crate's scope.

pub mod config;
pub mod identity;
pub mod normalize;
pub mod relay;
pub mod seen;
pub mod sim;
pub mod surface;

// Re-export commonly used types
pub use config::RelayConfig;
pub use identity::{resolve, MessageIdentity, ANCESTOR_HOP_LIMIT, DURABLE_ID_ATTRIBUTES};
pub use normalize::normalize;
pub use relay::{ChatRelay, CycleOutcome, Direction, EventKind, RelayError, RelayEvent};
pub use seen::SeenSet;
pub use sim::SimSurface;
pub use surface::{ChatSurface, InputHandle, MessageElement, SurfaceError};
