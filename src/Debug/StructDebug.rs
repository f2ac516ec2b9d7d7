use crate::Core::context::WorkerContext;
use crate::Inproc::{PipeState, ThreadContext};
use crate::Msg::{Message, PayloadBlock};
use std::fmt;

/// Debug function for Message
///
/// Shows the representation and size without dumping payload bytes.
/// Block-backed envelopes also show ownership state and reference count.
pub fn debug_message(msg: &Message, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut s = f.debug_struct("Message");
    s.field("representation", &msg.representation())
        .field("size", &msg.size());
    if let Some(ownership) = msg.ownership() {
        s.field("ownership", &ownership);
    }
    if let Some(refs) = msg.ref_count() {
        s.field("ref_count", &refs);
    }
    s.finish()
}

/// Debug function for PayloadBlock
///
/// Displays the data location without dereferencing it
pub fn debug_payload_block(block: &PayloadBlock, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PayloadBlock")
        .field("data", &format_args!("{:p}", block.as_slice().as_ptr()))
        .field("size", &block.size())
        .field("external", &block.is_external())
        .finish()
}

/// Debug function for ThreadContext
pub fn debug_thread_context(ctx: &ThreadContext, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ThreadContext")
        .field("id", &ctx.id())
        .field("signaling_fd", &ctx.signaling_fd())
        .field("pending_commands", &ctx.pending_commands())
        .field("pipe_hwm", &ctx.pipe_hwm())
        .finish()
}

pub fn debug_pipe_state(state: &PipeState, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PipeState")
        .field("in_flight", &state.in_flight())
        .finish_non_exhaustive()
}
