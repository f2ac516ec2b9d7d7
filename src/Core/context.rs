// Interfaces the readiness multiplexer consumes from worker threads and endpoints.

use std::fmt;
use std::os::raw::c_int;

/// Typed identifier of a worker-thread context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u32);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// The execution context that owns a set of endpoints.
///
/// Commands from other threads are queued on the context and announced
/// through its signaling descriptor. Only the context (or a caller acting on
/// its behalf, serialized) may drain them.
pub trait WorkerContext: Send + Sync {
    /// Stable identifier used to detect mixed-context poll sets.
    fn id(&self) -> ContextId;

    /// Descriptor that becomes readable while commands are pending.
    /// `None` when the platform or configuration cannot supply one.
    fn signaling_fd(&self) -> Option<c_int>;

    /// Process pending commands. With `block == false` returns immediately
    /// when nothing is queued.
    fn process_commands(&self, block: bool);
}

/// A message endpoint living inside exactly one worker context.
///
/// Readiness is a logical property of the endpoint's queues, re-derived by
/// direct query after every wakeup.
pub trait Endpoint {
    fn has_readable(&self) -> bool;

    fn has_writable(&self) -> bool;

    fn context(&self) -> &dyn WorkerContext;
}
