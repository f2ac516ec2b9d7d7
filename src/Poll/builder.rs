use super::item::PollItem;
use super::poller::poll_items;
use crate::Core::error::Result;
use crate::Core::Signaler;
use std::time::Duration;

/// Options for one readiness-multiplexer call.
///
/// The default blocks until at least one item is ready.
#[derive(Default)]
pub struct PollBuilder<'a> {
    timeout: Option<Duration>,
    interrupt: Option<&'a Signaler>,
}

impl<'a> PollBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give up after `timeout` and return `Ok(0)`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Return `Ok(0)` once `interrupt` is signalled. The signaler is not
    /// drained, so it keeps cancelling later calls until its owner resets it.
    pub fn with_interrupt(mut self, interrupt: &'a Signaler) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn poll(&self, items: &mut [PollItem<'_>]) -> Result<usize> {
        poll_items(items, self.timeout, self.interrupt)
    }
}
