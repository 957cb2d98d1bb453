//! Fire-and-forget execution diagnostics.
//!
//! Executed-command and error events are handed to a single background
//! worker over a channel and dispatched to the subscribers in send order.
//! The contract is best-effort, at-most-once: a slow subscriber delays
//! later events but never the executing session, and a panicking or
//! failing subscriber is swallowed. This is the one place in the crate
//! where failures are deliberately discarded.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::error::MuxError;

enum Event {
    Command(String),
    Error(String, String),
    Flush(Sender<()>),
}

/// Serialized background dispatch of execution diagnostics.
pub struct DiagnosticHub {
    // Mutex keeps the hub Sync so it can be shared behind an Arc.
    sender: Mutex<Sender<Event>>,
    enabled: AtomicBool,
}

impl DiagnosticHub {
    /// Spawn the dispatch worker. `on_command` sees every executed command
    /// text, `on_error` the failing text and the error description.
    pub fn spawn<C, E>(on_command: C, on_error: E) -> Self
    where
        C: Fn(&str) + Send + 'static,
        E: Fn(&str, &str) + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel::<Event>();
        thread::spawn(move || {
            while let Ok(event) = receiver.recv() {
                match event {
                    Event::Flush(ack) => {
                        let _ = ack.send(());
                    }
                    event => {
                        let dispatched = catch_unwind(AssertUnwindSafe(|| match &event {
                            Event::Command(text) => on_command(text),
                            Event::Error(text, error) => on_error(text, error),
                            Event::Flush(_) => {}
                        }));
                        if dispatched.is_err() {
                            warn!("diagnostic subscriber panicked; event dropped");
                        }
                    }
                }
            }
        });
        Self {
            sender: Mutex::new(sender),
            enabled: AtomicBool::new(true),
        }
    }

    fn send(&self, event: Event) {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = sender.send(event);
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Report a successfully executed command.
    pub fn command_executed(&self, text: impl Into<String>) {
        if self.is_enabled() {
            self.send(Event::Command(text.into()));
        }
    }

    /// Report a failed command.
    pub fn command_failed(&self, text: impl Into<String>, error: &MuxError) {
        if self.is_enabled() {
            self.send(Event::Error(text.into(), error.to_string()));
        }
    }

    /// Block until every event sent before this call has been dispatched.
    /// Intended for tests and orderly shutdown.
    pub fn flush(&self) {
        let (ack, done) = mpsc::channel();
        self.send(Event::Flush(ack));
        let _ = done.recv_timeout(Duration::from_secs(5));
    }
}
