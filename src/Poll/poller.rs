// Readiness multiplexer over raw descriptors and message endpoints.
//
// Endpoint readiness is a property of queue state inside the endpoint's
// worker context. The context's signaling descriptor only says that state
// may have changed, so after every wakeup pending commands are drained and
// readiness is re-derived by asking the endpoints directly.

use std::io;
use std::time::{Duration, Instant};

use super::item::{PollFlags, PollItem, PollSource};
use crate::Core::context::WorkerContext;
use crate::Core::error::{Error, Result};
use crate::Core::wait::WaitSet;
use crate::Core::Signaler;

/// Block until at least one item's requested interest is satisfied.
///
/// Returns the number of ready items and fills each item's `revents`.
/// With `timeout` set, returns `Ok(0)` once it expires; without one the
/// call only returns when something is ready.
///
/// # Errors
/// * `Error::CrossContextMixing` if endpoint items belong to different
///   worker contexts. Nothing is waited on.
/// * `Error::Unsupported` if the endpoints' context has no signaling
///   descriptor.
pub fn poll(items: &mut [PollItem<'_>], timeout: Option<Duration>) -> Result<usize> {
    poll_items(items, timeout, None)
}

pub(super) fn poll_items(
    items: &mut [PollItem<'_>],
    timeout: Option<Duration>,
    interrupt: Option<&Signaler>,
) -> Result<usize> {
    let mut set = WaitSet::with_capacity(items.len() + 2);
    let mut context: Option<&dyn WorkerContext> = None;

    // Raw descriptors occupy the first slots of the wait set, in item order.
    for item in items.iter() {
        match item.source {
            PollSource::Fd(fd) => {
                set.push(fd, item.events);
            }
            PollSource::Endpoint(endpoint) => {
                let owner = endpoint.context();
                match context {
                    Some(first) if first.id() != owner.id() => {
                        tracing::debug!(
                            first = %first.id(),
                            second = %owner.id(),
                            "poll rejected: endpoints from different contexts"
                        );
                        return Err(Error::CrossContextMixing {
                            first: first.id(),
                            second: owner.id(),
                        });
                    }
                    Some(_) => {}
                    None => context = Some(owner),
                }
            }
        }
    }

    let signal_slot = match context {
        Some(ctx) => match ctx.signaling_fd() {
            Some(fd) => Some(set.push(fd, PollFlags::READABLE)),
            None => {
                return Err(Error::Unsupported(
                    "worker context has no signaling descriptor",
                ))
            }
        },
        None => None,
    };
    let interrupt_slot = interrupt.map(|signaler| set.push(signaler.raw_fd(), PollFlags::READABLE));

    if set.is_empty() && timeout.is_none() {
        // Nothing could ever wake us.
        return Ok(0);
    }

    let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
    let mut initial = true;

    loop {
        // The first pass only checks. Blocking straight away would miss
        // endpoints that were ready before the call while nothing signals
        // the descriptor.
        let wait_for = if initial {
            Some(Duration::ZERO)
        } else {
            deadline.map(|d| d.saturating_duration_since(Instant::now()))
        };

        match set.wait(wait_for) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                tracing::trace!("poll wait interrupted by signal, retrying");
                continue;
            }
            Err(e) if e.kind() == io::ErrorKind::Unsupported => {
                return Err(Error::Unsupported("descriptor polling is not available"));
            }
            Err(e) => return Err(e.into()),
        }
        initial = false;

        // Commands must be processed before endpoint readiness is evaluated.
        if let (Some(slot), Some(ctx)) = (signal_slot, context) {
            if set.readiness(slot).contains(PollFlags::READABLE) {
                tracing::trace!(ctx = %ctx.id(), "draining commands before readiness check");
                ctx.process_commands(false);
            }
        }

        let mut nevents = 0;
        let mut fd_slot = 0;
        for item in items.iter_mut() {
            item.revents = match item.source {
                PollSource::Fd(_) => {
                    let observed = set.readiness(fd_slot) & item.events;
                    fd_slot += 1;
                    observed
                }
                PollSource::Endpoint(endpoint) => {
                    let mut observed = PollFlags::empty();
                    if item.events.contains(PollFlags::WRITABLE) && endpoint.has_writable() {
                        observed |= PollFlags::WRITABLE;
                    }
                    if item.events.contains(PollFlags::READABLE) && endpoint.has_readable() {
                        observed |= PollFlags::READABLE;
                    }
                    observed
                }
            };
            if !item.revents.is_empty() {
                nevents += 1;
            }
        }

        if nevents > 0 {
            tracing::trace!(nevents, "poll satisfied");
            return Ok(nevents);
        }

        if let Some(slot) = interrupt_slot {
            if set.readiness(slot).contains(PollFlags::READABLE) {
                tracing::debug!("poll cancelled by interrupt signaler");
                return Ok(0);
            }
        }

        // A timeout too large for `Instant` behaves as an unbounded wait.
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return Ok(0);
            }
        }
    }
}
