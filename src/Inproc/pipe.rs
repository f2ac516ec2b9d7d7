// In-process pipe between two worker contexts.
//
// A writer moves envelopes into `pending` and asks the reader's context to
// activate the pipe. Only after that command is processed do the messages
// become visible in `delivered`, so reader readiness changes exactly when
// commands are drained.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use super::context::{Command, ThreadContext};
use crate::Core::context::{Endpoint, WorkerContext};
use crate::Msg::Message;

/// Queues shared by the two ends of a pipe.
pub struct PipeState {
    pending: Mutex<VecDeque<Message>>,
    delivered: Mutex<VecDeque<Message>>,
    /// Messages sent and not yet received.
    in_flight: AtomicUsize,
    hwm: usize,
    writer_closed: AtomicBool,
    reader_closed: AtomicBool,
}

impl PipeState {
    pub(crate) fn activate(&self) {
        let mut pending = self.pending.lock();
        if pending.is_empty() {
            return;
        }
        let mut delivered = self.delivered.lock();
        delivered.extend(pending.drain(..));
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Create a pipe written from `writer_ctx` and read from `reader_ctx`.
/// The reader's context supplies the high-water mark.
pub fn pipe(writer_ctx: &Arc<ThreadContext>, reader_ctx: &Arc<ThreadContext>) -> (PipeWriter, PipeReader) {
    let state = Arc::new(PipeState {
        pending: Mutex::new(VecDeque::new()),
        delivered: Mutex::new(VecDeque::new()),
        in_flight: AtomicUsize::new(0),
        hwm: reader_ctx.pipe_hwm(),
        writer_closed: AtomicBool::new(false),
        reader_closed: AtomicBool::new(false),
    });
    let writer = PipeWriter {
        state: state.clone(),
        ctx: writer_ctx.clone(),
        peer: reader_ctx.clone(),
    };
    let reader = PipeReader {
        state,
        ctx: reader_ctx.clone(),
        peer: writer_ctx.clone(),
    };
    (writer, reader)
}

/// Sending end of a pipe, owned by the writer's context.
pub struct PipeWriter {
    state: Arc<PipeState>,
    ctx: Arc<ThreadContext>,
    peer: Arc<ThreadContext>,
}

impl PipeWriter {
    /// Move `msg` into the pipe, leaving it empty.
    ///
    /// # Returns
    /// * `Err(WouldBlock)` if the pipe is at its high-water mark; `msg` is untouched.
    /// * `Err(BrokenPipe)` if the reader has been dropped.
    pub fn send(&self, msg: &mut Message) -> io::Result<()> {
        if self.state.reader_closed.load(Ordering::Acquire) {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "Reader has terminated",
            ));
        }

        // Reserve a slot first so concurrent senders cannot overshoot the mark.
        let mut current = self.state.in_flight.load(Ordering::Acquire);
        loop {
            if current >= self.state.hwm {
                return Err(io::Error::new(
                    io::ErrorKind::WouldBlock,
                    "Pipe full - high-water mark reached",
                ));
            }
            match self.state.in_flight.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }

        let mut queued = Message::new();
        queued.move_from(msg);
        self.state.pending.lock().push_back(queued);
        self.peer.send_command(Command::Activate(self.state.clone()));
        Ok(())
    }
}

impl Endpoint for PipeWriter {
    fn has_readable(&self) -> bool {
        false
    }

    /// Also true once the reader is gone, so a poller wakes and the next
    /// `send` reports `BrokenPipe`.
    fn has_writable(&self) -> bool {
        self.state.reader_closed.load(Ordering::Acquire)
            || self.state.in_flight.load(Ordering::Acquire) < self.state.hwm
    }

    fn context(&self) -> &dyn WorkerContext {
        &*self.ctx
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        self.state.writer_closed.store(true, Ordering::Release);
        self.peer.send_command(Command::Wake);
    }
}

/// Receiving end of a pipe, owned by the reader's context.
pub struct PipeReader {
    state: Arc<PipeState>,
    ctx: Arc<ThreadContext>,
    peer: Arc<ThreadContext>,
}

impl PipeReader {
    /// Move the next delivered message into `msg`, closing what it held.
    ///
    /// # Returns
    /// * `Err(WouldBlock)` if nothing has been delivered yet.
    /// * `Err(BrokenPipe)` if nothing is left and the writer has been dropped.
    pub fn recv(&self, msg: &mut Message) -> io::Result<()> {
        let next = self.state.delivered.lock().pop_front();
        match next {
            Some(mut received) => {
                msg.move_from(&mut received);
                let before = self.state.in_flight.fetch_sub(1, Ordering::AcqRel);
                if before == self.state.hwm {
                    // The writer just became writable again.
                    self.peer.send_command(Command::Wake);
                }
                Ok(())
            }
            None => {
                if self.state.writer_closed.load(Ordering::Acquire)
                    && self.state.pending.lock().is_empty()
                {
                    return Err(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "Writer has terminated",
                    ));
                }
                Err(io::Error::new(
                    io::ErrorKind::WouldBlock,
                    "No message delivered",
                ))
            }
        }
    }

    /// Receive, processing this context's commands until a message arrives.
    pub fn recv_blocking(&self, msg: &mut Message) -> io::Result<()> {
        loop {
            match self.recv(msg) {
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    self.ctx.process_commands(true);
                }
                other => return other,
            }
        }
    }

    pub fn state(&self) -> &PipeState {
        &self.state
    }
}

impl Endpoint for PipeReader {
    /// Also true once the writer is gone and nothing is left in transit,
    /// so a poller wakes and the next `recv` reports `BrokenPipe`.
    fn has_readable(&self) -> bool {
        if !self.state.delivered.lock().is_empty() {
            return true;
        }
        self.state.writer_closed.load(Ordering::Acquire) && self.state.pending.lock().is_empty()
    }

    fn has_writable(&self) -> bool {
        false
    }

    fn context(&self) -> &dyn WorkerContext {
        &*self.ctx
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        self.state.reader_closed.store(true, Ordering::Release);
        self.peer.send_command(Command::Wake);
    }
}
