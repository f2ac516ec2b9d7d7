use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::io;
use std::os::raw::c_int;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use super::pipe::PipeState;
use crate::Core::context::{ContextId, WorkerContext};
use crate::Core::{AtomicCounter, Signaler};

static NEXT_CONTEXT_ID: AtomicU32 = AtomicU32::new(1);

/// Commands other threads post to a worker context.
pub enum Command {
    /// Make the messages a writer queued on this pipe visible to its reader.
    Activate(Arc<PipeState>),
    /// Nothing to apply; readiness of the context's endpoints may have changed.
    Wake,
}

impl Command {
    fn apply(self) {
        match self {
            Command::Activate(pipe) => pipe.activate(),
            Command::Wake => {}
        }
    }
}

pub struct ContextBuilder {
    signaler: bool,
    pipe_hwm: usize,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self {
            signaler: true,
            pipe_hwm: 1000, // messages in flight per pipe
        }
    }
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the context announces commands through a pollable descriptor.
    /// Without one, endpoints of this context cannot be polled and callers
    /// must block through [`WorkerContext::process_commands`].
    pub fn with_signaler(mut self, enabled: bool) -> Self {
        self.signaler = enabled;
        self
    }

    /// Maximum number of undelivered messages on pipes read by this context.
    pub fn with_pipe_hwm(mut self, hwm: usize) -> Self {
        self.pipe_hwm = hwm;
        self
    }

    pub fn build(self) -> io::Result<Arc<ThreadContext>> {
        if self.pipe_hwm == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Pipe high-water mark must be greater than zero",
            ));
        }
        let signaler = if self.signaler {
            Some(Signaler::new()?)
        } else {
            None
        };
        let id = ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(ctx = %id, signaler = self.signaler, "worker context created");
        Ok(Arc::new(ThreadContext {
            id,
            signaler,
            commands: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            pending: AtomicCounter::new(0),
            pipe_hwm: self.pipe_hwm,
        }))
    }
}

/// In-process worker context: a command mailbox plus the signaling
/// descriptor that announces it.
pub struct ThreadContext {
    id: ContextId,
    signaler: Option<Signaler>,
    commands: Mutex<VecDeque<Command>>,
    available: Condvar,
    pending: AtomicCounter,
    pipe_hwm: usize,
}

impl ThreadContext {
    /// Queue a command for this context and wake whoever waits on it.
    pub fn send_command(&self, command: Command) {
        {
            let mut queue = self.commands.lock();
            queue.push_back(command);
            self.pending.add(1);
        }
        self.available.notify_all();
        if let Some(signaler) = &self.signaler {
            if let Err(e) = signaler.signal() {
                tracing::warn!(ctx = %self.id, error = %e, "failed to signal worker context");
            }
        }
    }

    /// Commands queued but not yet processed.
    pub fn pending_commands(&self) -> u32 {
        self.pending.get()
    }

    pub fn pipe_hwm(&self) -> usize {
        self.pipe_hwm
    }

    pub fn has_signaler(&self) -> bool {
        self.signaler.is_some()
    }
}

impl WorkerContext for ThreadContext {
    fn id(&self) -> ContextId {
        self.id
    }

    fn signaling_fd(&self) -> Option<c_int> {
        self.signaler.as_ref().map(Signaler::raw_fd)
    }

    fn process_commands(&self, block: bool) {
        // Reset before taking the batch: a command queued after this point
        // signals again and is picked up by the next wakeup.
        if let Some(signaler) = &self.signaler {
            if let Err(e) = signaler.reset() {
                tracing::warn!(ctx = %self.id, error = %e, "failed to reset signaler");
            }
        }

        let batch: Vec<Command> = {
            let mut queue = self.commands.lock();
            if block {
                while queue.is_empty() {
                    self.available.wait(&mut queue);
                }
            }
            queue.drain(..).collect()
        };

        if batch.is_empty() {
            return;
        }
        tracing::trace!(ctx = %self.id, count = batch.len(), "processing commands");
        for command in batch {
            command.apply();
            self.pending.sub(1);
        }
    }
}
