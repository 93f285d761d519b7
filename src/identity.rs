//! Stable message identity.
//!
//! A message must keep the same identity across re-renders, scrolling and
//! lazy loading, or the relay would replay old messages as new ones. Two
//! kinds of identity exist:
//!
//! - **Durable**: taken from an identifier attribute the chat client itself
//!   exposes on the bubble markup. Survives sibling re-renders and cosmetic
//!   DOM churn, so it is always preferred.
//! - **Fingerprint**: a SHA-256 digest of the element's full serialized
//!   representation, used when no durable identifier exists anywhere near
//!   the element. Deliberately coarse: two messages with identical visible
//!   text but different markup stay distinct, and a cosmetic-only re-render
//!   of the same message produces a fresh identity. That precision loss is
//!   the accepted cost of never silently skipping a genuinely new message.

use std::fmt;

use sha2::{Digest, Sha256};
use tracing::trace;

use crate::surface::MessageElement;

/// Identifier attributes probed for a durable identity, in priority order.
pub const DURABLE_ID_ATTRIBUTES: &[&str] = &["data-message-id", "data-mid", "data-msg-id", "id"];

/// How far up the ancestor chain the durable-attribute walk goes.
pub const ANCESTOR_HOP_LIMIT: usize = 6;

/// Stable identity of one message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageIdentity {
    /// Document-exposed identifier: which attribute it came from, and its value.
    Durable { source: String, value: String },
    /// Content-derived hash over the full serialized representation.
    Fingerprint(String),
}

impl MessageIdentity {
    pub fn is_durable(&self) -> bool {
        matches!(self, MessageIdentity::Durable { .. })
    }
}

impl fmt::Display for MessageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageIdentity::Durable { source, value } => write!(f, "durable:{source}:{value}"),
            MessageIdentity::Fingerprint(hash) => write!(f, "fingerprint:{hash}"),
        }
    }
}

/// Resolve the identity of a message element.
///
/// Probes run in fixed order, first success wins: the element's own
/// attributes, then each ancestor level up to [`ANCESTOR_HOP_LIMIT`], then
/// descendants in document order, and finally the fingerprint fallback.
/// A transient failure reading one attribute counts as "absent" for that
/// probe; only failing to serialize the element for the fallback is an
/// error, because at that point there is nothing left to derive an identity
/// from.
pub fn resolve<E>(element: &E) -> Result<MessageIdentity, crate::surface::SurfaceError>
where
    E: MessageElement + ?Sized,
{
    for name in DURABLE_ID_ATTRIBUTES {
        if let Some(value) = nonempty(element.attribute(name).ok().flatten()) {
            return Ok(durable(name, value));
        }
    }

    for hop in 1..=ANCESTOR_HOP_LIMIT {
        for name in DURABLE_ID_ATTRIBUTES {
            if let Some(value) = nonempty(element.ancestor_attribute(hop, name).ok().flatten()) {
                return Ok(durable(name, value));
            }
        }
    }

    for name in DURABLE_ID_ATTRIBUTES {
        if let Some(value) = nonempty(element.descendant_attribute(name).ok().flatten()) {
            return Ok(durable(name, value));
        }
    }

    let repr = element.outer_html()?;
    let hash = fingerprint(&repr);
    trace!("no durable identifier found, fingerprinted as {hash}");
    Ok(MessageIdentity::Fingerprint(hash))
}

fn durable(source: &str, value: String) -> MessageIdentity {
    MessageIdentity::Durable {
        source: source.to_string(),
        value,
    }
}

fn nonempty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// SHA-256 hex digest of a serialized representation.
pub fn fingerprint(repr: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(repr.as_bytes());
    format!("{:x}", hasher.finalize())
}
