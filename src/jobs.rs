//! Background generation jobs for the UI thread.
//!
//! Requests run on a tokio runtime owned by [`JobRunner`] and post their
//! result back over a channel the event loop drains every tick. Each job gets
//! a [`Ticket`]; a view remembers the ticket it is waiting for in a
//! [`PendingSlot`] and only applies a result whose ticket still matches, so a
//! result that arrives after the view was left or re-requested is dropped.

use std::future::Future;
use std::sync::mpsc::{self, Receiver, Sender};

use anyhow::{Context, Result};
use tokio::runtime::{self, Runtime};
use tracing::debug;

use crate::genai::{GeneratedQuestion, PcmAudio};

/// Identifies one spawned job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

#[cfg(test)]
impl Ticket {
    pub(crate) fn for_test(id: u64) -> Self {
        Ticket(id)
    }
}

/// What a finished job produced. `None` payloads mean the service had
/// nothing usable to return.
#[derive(Debug)]
pub enum JobOutput {
    Quiz(Option<Vec<GeneratedQuestion>>),
    Prayer(Option<String>),
    Insight(Option<String>),
    Mentor(Option<String>),
    Speech(Option<PcmAudio>),
}

pub struct JobRunner {
    runtime: Runtime,
    next: u64,
    tx: Sender<(Ticket, JobOutput)>,
    rx: Receiver<(Ticket, JobOutput)>,
}

impl JobRunner {
    pub fn new() -> Result<Self> {
        let runtime = runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("genai-worker")
            .enable_all()
            .build()
            .context("failed to start background runtime")?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            runtime,
            next: 0,
            tx,
            rx,
        })
    }

    /// Run `job` in the background and return the ticket its result will
    /// carry.
    pub fn spawn<F>(&mut self, job: F) -> Ticket
    where
        F: Future<Output = JobOutput> + Send + 'static,
    {
        self.next += 1;
        let ticket = Ticket(self.next);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let output = job.await;
            // The receiver only goes away when the app is shutting down.
            let _ = tx.send((ticket, output));
        });
        debug!(ticket = ticket.0, "job spawned");
        ticket
    }

    /// Results that finished since the last call. Never blocks.
    pub fn drain(&self) -> Vec<(Ticket, JobOutput)> {
        self.rx.try_iter().collect()
    }
}

/// The ticket a view is currently waiting on.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PendingSlot {
    ticket: Option<Ticket>,
}

impl PendingSlot {
    /// Wait for `ticket`, superseding anything requested before.
    pub fn begin(&mut self, ticket: Ticket) {
        self.ticket = Some(ticket);
    }

    /// Stop waiting. A late result for the old ticket will be rejected.
    pub fn cancel(&mut self) {
        self.ticket = None;
    }

    pub fn is_pending(&self) -> bool {
        self.ticket.is_some()
    }

    /// `true` when `ticket` is the one this slot waits for; the slot is then
    /// cleared.
    pub fn accept(&mut self, ticket: Ticket) -> bool {
        if self.ticket == Some(ticket) {
            self.ticket = None;
            true
        } else {
            false
        }
    }
}
