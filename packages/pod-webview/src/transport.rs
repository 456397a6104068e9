//! # Transports
//!
//! A transport takes already-encoded JSON text and hands it to whatever sits
//! on the other side. The bridge owns two of them:
//!
//! ```text
//! ┌──────────────┐   available?   ┌───────────────────────────────┐
//! │    Bridge    │───── yes ─────►│ native  (window.PodBridge)    │
//! │   emit(..)   │                └───────────────────────────────┘
//! │              │───── no ──────►┌───────────────────────────────┐
//! └──────────────┘                │ fallback (parent.postMessage) │
//!                                 └───────────────────────────────┘
//! ```
//!
//! Availability is probed on every send; implementations must not cache it.
//! Browser implementations live in `ffi::web_transport`.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};

/// Which path an event left through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Host-provided message channel
    Native,
    /// Cross-frame `postMessage` to the parent window
    Fallback,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Native => write!(f, "native"),
            TransportKind::Fallback => write!(f, "fallback"),
        }
    }
}

/// A channel that accepts JSON text
pub trait Transport {
    /// Whether the channel exists right now. Re-evaluated on every call.
    fn is_available(&self) -> bool;

    /// Hand `payload` to the channel. Returns once handed off; nothing is
    /// awaited from the receiving side.
    fn post(&self, payload: &str) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for Rc<T> {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn post(&self, payload: &str) -> Result<()> {
        (**self).post(payload)
    }
}

// ============================================================================
// NULL TRANSPORT
// ============================================================================

/// A transport that is never available.
///
/// Default native transport outside the browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn is_available(&self) -> bool {
        false
    }

    fn post(&self, _payload: &str) -> Result<()> {
        Err(Error::TransportUnavailable("no channel attached".to_string()))
    }
}

// ============================================================================
// MEMORY TRANSPORT
// ============================================================================

/// In-process transport that records every payload it accepts.
///
/// Availability and failure can be flipped at any time, which makes it the
/// test double for both sides of the bridge and a loopback for native
/// embedders that drain the outbox themselves.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    available: Cell<bool>,
    failure: RefCell<Option<Error>>,
    sent: RefCell<Vec<String>>,
    attempts: Cell<usize>,
}

impl MemoryTransport {
    /// An available transport that accepts everything
    pub fn new() -> Self {
        Self {
            available: Cell::new(true),
            ..Self::default()
        }
    }

    /// A transport that reports itself unavailable
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Change what `is_available` reports
    pub fn set_available(&self, available: bool) {
        self.available.set(available);
    }

    /// Make every following `post` fail with `error`, or succeed again with `None`
    pub fn fail_with(&self, error: Option<Error>) {
        *self.failure.borrow_mut() = error;
    }

    /// Payloads accepted so far, oldest first
    pub fn sent(&self) -> Vec<String> {
        self.sent.borrow().clone()
    }

    /// Remove and return the accepted payloads
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.sent.borrow_mut())
    }

    /// Number of `post` calls, failed ones included
    pub fn attempts(&self) -> usize {
        self.attempts.get()
    }
}

impl Transport for MemoryTransport {
    fn is_available(&self) -> bool {
        self.available.get()
    }

    fn post(&self, payload: &str) -> Result<()> {
        self.attempts.set(self.attempts.get() + 1);
        if let Some(err) = self.failure.borrow().clone() {
            return Err(err);
        }
        self.sent.borrow_mut().push(payload.to_string());
        Ok(())
    }
}
